use std::collections::HashSet;

use log::{error, info, warn};
use url::Url;

use crate::config::Config;
use crate::dedup;
use crate::fetcher::Fetch;
use crate::models::JobEntity;
use crate::processor::Processor;
use crate::store::{CellValue, JobSheet, Worksheet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Batch write succeeded; carries the number of rows persisted.
    Appended(usize),
    /// Nothing survived dedup and keyword filtering.
    NoNewJobs,
    /// Qualifying jobs existed but the batch write failed; nothing was
    /// persisted this run.
    StoreWriteFailed,
}

#[derive(Debug)]
pub struct RunReport {
    pub pages_failed: usize,
    pub candidates_found: usize,
    pub new_candidates: usize,
    pub matched: usize,
    pub outcome: RunOutcome,
}

/// One harvesting run: paginate the listing, dedup against the sheet,
/// filter by detail-page keywords, append the survivors in one batch.
/// Strictly sequential; failures are isolated per page and per detail
/// fetch, and persistence happens exactly once at the end.
pub struct Pipeline<F: Fetch, W: Worksheet> {
    fetcher: F,
    processor: Processor,
    sheet: JobSheet<W>,
    config: Config,
}

impl<F: Fetch, W: Worksheet> Pipeline<F, W> {
    pub fn new(fetcher: F, processor: Processor, sheet: JobSheet<W>, config: Config) -> Self {
        Pipeline {
            fetcher,
            processor,
            sheet,
            config,
        }
    }

    pub fn run(&mut self) -> RunReport {
        // Snapshot once; never re-read during the run.
        let existing: HashSet<String> = self.sheet.existing_titles().into_iter().collect();

        let mut candidates = Vec::new();
        let mut pages_failed = 0;
        for page in self.config.start_page..=self.config.max_pages {
            let url = page_url(&self.config.base_url, page);
            info!("Fetching listing page {}: {}", page, url);
            match self.fetcher.fetch(url.as_str()) {
                Ok(html) => {
                    candidates.extend(self.processor.parse_listing(&html, &self.config.base_url))
                }
                Err(e) => {
                    error!("Failed to fetch listing page {}: {}", page, e);
                    pages_failed += 1;
                }
            }
        }
        let candidates_found = candidates.len();

        let fresh = dedup::filter_new(candidates, &existing);
        let new_candidates = fresh.len();
        info!(
            "{} candidates found, {} new after dedup.",
            candidates_found, new_candidates
        );

        let mut jobs: Vec<JobEntity> = fresh.into_iter().map(JobEntity::from).collect();
        for job in &mut jobs {
            info!("Checking detail page: {}", job.url);
            match self.fetcher.fetch(&job.url) {
                Ok(html) => {
                    job.is_target = self.processor.matches_keywords(&html, &self.config.keywords)
                }
                Err(e) => {
                    warn!("Skipping detail page {} ({})", job.url, e);
                    job.is_target = false;
                }
            }
        }

        let rows: Vec<Vec<CellValue>> = jobs
            .iter()
            .filter(|job| job.is_target)
            .map(JobEntity::to_row)
            .collect();
        let matched = rows.len();

        let outcome = if rows.is_empty() {
            info!("No new jobs to add.");
            RunOutcome::NoNewJobs
        } else if self.sheet.append_rows(&rows) {
            info!("Added {} new jobs to the sheet.", matched);
            RunOutcome::Appended(matched)
        } else {
            error!("Batch write failed; {} jobs were not persisted.", matched);
            RunOutcome::StoreWriteFailed
        };

        RunReport {
            pages_failed,
            candidates_found,
            new_candidates,
            matched,
            outcome,
        }
    }
}

fn page_url(base: &Url, page: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use crate::store::tests::{seeded_grid, MemWorksheet};
    use crate::store::TITLE_COL;
    use chrono::Local;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    struct FakeFetcher {
        pages: HashMap<String, String>,
        failing: HashSet<String>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            FakeFetcher {
                pages: HashMap::new(),
                failing: HashSet::new(),
            }
        }

        fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn failing_on(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }
    }

    impl Fetch for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if self.failing.contains(url) {
                return Err(FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: 4,
                    status: StatusCode::SERVICE_UNAVAILABLE,
                });
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or(FetchError::Status(StatusCode::NOT_FOUND))
        }
    }

    fn test_config(max_pages: u32) -> Config {
        Config {
            base_url: Url::parse("https://jobs.example.com/engineer").unwrap(),
            user_agent: "test".to_string(),
            start_page: 1,
            max_pages,
            timeout: Duration::from_secs(1),
            request_pause: Duration::from_millis(0),
            max_retries: 0,
            backoff_step: Duration::from_millis(0),
            keywords: vec!["python".to_string()],
            sheet_path: PathBuf::new(),
        }
    }

    fn card(title: &str, href: &str, price: &str) -> String {
        format!(
            r#"<div class="c-job-card pc-show">
                 <div class="c-job-card__heading"><a href="{}">go</a></div>
                 <h3 class="c-job-card__title">{}</h3>
                 <div class="c-job-price"><span>{}</span></div>
               </div>"#,
            href, title, price
        )
    }

    fn detail(matches: bool) -> String {
        let description = if matches { "Python required" } else { "Kotlin only" };
        format!(
            r#"<html><body><script type="application/ld+json">
               {{"@type":"JobPosting","description":"{}"}}
               </script></body></html>"#,
            description
        )
    }

    #[test]
    fn end_to_end_appends_only_new_matching_jobs() {
        let listing = format!(
            "<html><body>{}{}</body></html>",
            card("A", "/job/a", "100,000"),
            card("B", "/job/b", "unknown")
        );
        let fetcher = FakeFetcher::new()
            .with("https://jobs.example.com/engineer?page=1", &listing)
            .with("https://jobs.example.com/job/b", &detail(true));

        let grid = seeded_grid(&["A"]);
        let sheet = JobSheet::new(MemWorksheet::new(grid.clone()));
        let mut pipeline =
            Pipeline::new(fetcher, Processor::default(), sheet, test_config(1));

        let report = pipeline.run();
        assert_eq!(report.candidates_found, 2);
        assert_eq!(report.new_candidates, 1);
        assert_eq!(report.outcome, RunOutcome::Appended(1));

        let grid = grid.borrow();
        assert_eq!(grid.len(), 4);
        let row = &grid[3];
        let today = Local::now().format("%Y/%m/%d").to_string();
        assert_eq!(row[1], today); // B: capture date
        assert_eq!(row[TITLE_COL - 1], "B");
        assert_eq!(row[6], "0"); // G: avg monthly, price unknown
        assert_eq!(row[20], "https://jobs.example.com/job/b"); // U: url
    }

    #[test]
    fn failed_page_contributes_nothing_but_run_continues() {
        let listing = format!("<html><body>{}</body></html>", card("C", "/job/c", "500,000"));
        let fetcher = FakeFetcher::new()
            .failing_on("https://jobs.example.com/engineer?page=1")
            .with("https://jobs.example.com/engineer?page=2", &listing)
            .with("https://jobs.example.com/job/c", &detail(true));

        let sheet = JobSheet::new(MemWorksheet::new(seeded_grid(&[])));
        let mut pipeline =
            Pipeline::new(fetcher, Processor::default(), sheet, test_config(2));

        let report = pipeline.run();
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.candidates_found, 1);
        assert_eq!(report.outcome, RunOutcome::Appended(1));
    }

    #[test]
    fn failed_detail_fetch_fails_closed() {
        let listing = format!("<html><body>{}</body></html>", card("D", "/job/d", "0"));
        let fetcher = FakeFetcher::new()
            .with("https://jobs.example.com/engineer?page=1", &listing)
            .failing_on("https://jobs.example.com/job/d");

        let sheet = JobSheet::new(MemWorksheet::new(seeded_grid(&[])));
        let mut pipeline =
            Pipeline::new(fetcher, Processor::default(), sheet, test_config(1));

        let report = pipeline.run();
        assert_eq!(report.new_candidates, 1);
        assert_eq!(report.matched, 0);
        assert_eq!(report.outcome, RunOutcome::NoNewJobs);
    }

    #[test]
    fn non_matching_detail_is_not_persisted() {
        let listing = format!("<html><body>{}</body></html>", card("E", "/job/e", "300,000"));
        let fetcher = FakeFetcher::new()
            .with("https://jobs.example.com/engineer?page=1", &listing)
            .with("https://jobs.example.com/job/e", &detail(false));

        let grid = seeded_grid(&[]);
        let sheet = JobSheet::new(MemWorksheet::new(grid.clone()));
        let mut pipeline =
            Pipeline::new(fetcher, Processor::default(), sheet, test_config(1));

        let report = pipeline.run();
        assert_eq!(report.matched, 0);
        assert_eq!(report.outcome, RunOutcome::NoNewJobs);
        assert_eq!(grid.borrow().len(), 2); // headers only
    }

    #[test]
    fn store_write_failure_is_a_failed_outcome() {
        let listing = format!("<html><body>{}</body></html>", card("F", "/job/f", "400,000"));
        let fetcher = FakeFetcher::new()
            .with("https://jobs.example.com/engineer?page=1", &listing)
            .with("https://jobs.example.com/job/f", &detail(true));

        let mut worksheet = MemWorksheet::new(seeded_grid(&[]));
        worksheet.fail_writes = true;
        let sheet = JobSheet::new(worksheet);
        let mut pipeline =
            Pipeline::new(fetcher, Processor::default(), sheet, test_config(1));

        let report = pipeline.run();
        assert_eq!(report.matched, 1);
        assert_eq!(report.outcome, RunOutcome::StoreWriteFailed);
    }

    #[test]
    fn failed_title_read_falls_open_to_empty_snapshot() {
        // "A" is already in the sheet, but the read fails, so it is
        // re-appended. Documented duplicate-write risk.
        let listing = format!("<html><body>{}</body></html>", card("A", "/job/a", "100,000"));
        let fetcher = FakeFetcher::new()
            .with("https://jobs.example.com/engineer?page=1", &listing)
            .with("https://jobs.example.com/job/a", &detail(true));

        let grid = seeded_grid(&["A"]);
        let worksheet = MemWorksheet::new(grid.clone());
        worksheet.fail_reads.set(1);
        let sheet = JobSheet::new(worksheet);
        let mut pipeline =
            Pipeline::new(fetcher, Processor::default(), sheet, test_config(1));

        let report = pipeline.run();
        assert_eq!(report.new_candidates, 1);
        assert_eq!(report.outcome, RunOutcome::Appended(1));
        // "A" now appears twice.
        let grid = grid.borrow();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[2][TITLE_COL - 1], "A");
        assert_eq!(grid[3][TITLE_COL - 1], "A");
    }
}

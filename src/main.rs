use std::process::ExitCode;

use log::{error, info};

use job_harvester::{
    logger, Config, CsvWorksheet, HttpFetcher, JobSheet, Pipeline, Processor, RunOutcome,
};

fn main() -> ExitCode {
    logger::init();
    info!("Starting job harvester...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Bad configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Target: {} (pages {}-{}), sheet: {:?}",
        config.base_url, config.start_page, config.max_pages, config.sheet_path
    );

    let fetcher = HttpFetcher::new(&config);
    let sheet = JobSheet::new(CsvWorksheet::new(&config.sheet_path));
    let mut pipeline = Pipeline::new(fetcher, Processor::default(), sheet, config);

    let report = pipeline.run();
    match report.outcome {
        RunOutcome::Appended(count) => {
            info!("Run complete: {} new jobs persisted.", count);
            ExitCode::SUCCESS
        }
        RunOutcome::NoNewJobs => {
            info!("Run complete: no new jobs this time.");
            ExitCode::SUCCESS
        }
        RunOutcome::StoreWriteFailed => {
            error!(
                "Run failed: {} qualifying jobs could not be persisted.",
                report.matched
            );
            ExitCode::FAILURE
        }
    }
}

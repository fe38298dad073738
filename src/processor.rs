use chrono::Local;
use log::debug;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::CandidateRecord;

/// CSS selectors for one listing site. Defaults target the site this
/// pipeline was built for; supply your own set to point it elsewhere.
#[derive(Debug, Clone)]
pub struct ParseRules {
    pub card: Selector,
    pub title: Selector,
    pub link: Selector,
    pub price: Selector,
    pub json_ld: Selector,
}

impl Default for ParseRules {
    fn default() -> Self {
        ParseRules::custom(
            ".c-job-card.pc-show",
            ".c-job-card__title",
            ".c-job-card__heading a",
            ".c-job-price span",
        )
        .expect("default selectors are valid")
    }
}

impl ParseRules {
    pub fn custom(card: &str, title: &str, link: &str, price: &str) -> Result<Self, String> {
        let parse = |s: &str| Selector::parse(s).map_err(|e| e.to_string());
        Ok(ParseRules {
            card: parse(card)?,
            title: parse(title)?,
            link: parse(link)?,
            price: parse(price)?,
            json_ld: parse(r#"script[type="application/ld+json"]"#)?,
        })
    }
}

/// Parses listing and detail HTML into pipeline data. Holds no state
/// beyond the selector set.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    rules: ParseRules,
}

impl Processor {
    pub fn new(rules: ParseRules) -> Self {
        Processor { rules }
    }

    /// Extracts candidate records from a listing page, in document
    /// order. Cards missing a title or link are skipped, not fatal.
    /// Relative links are resolved against `base`.
    pub fn parse_listing(&self, html: &str, base: &Url) -> Vec<CandidateRecord> {
        let document = Html::parse_document(html);
        let captured_on = Local::now().format("%Y/%m/%d").to_string();
        let mut candidates = Vec::new();

        for card in document.select(&self.rules.card) {
            let title = match card.select(&self.rules.title).next() {
                Some(el) => element_text(&el),
                None => {
                    debug!("Skipping card without a title element.");
                    continue;
                }
            };
            let href = card
                .select(&self.rules.link)
                .next()
                .and_then(|el| el.value().attr("href"));
            let (title, href) = match (title, href) {
                (t, Some(h)) if !t.is_empty() => (t, h),
                _ => {
                    debug!("Skipping card without title text or link.");
                    continue;
                }
            };
            let url = match base.join(href) {
                Ok(u) => u.to_string(),
                Err(_) => {
                    debug!("Skipping card with unresolvable link {:?}.", href);
                    continue;
                }
            };

            let max_monthly = card
                .select(&self.rules.price)
                .next()
                .map(|el| parse_price(&element_text(&el)))
                .unwrap_or(0);

            candidates.push(CandidateRecord {
                title,
                url,
                max_monthly,
                captured_on: captured_on.clone(),
            });
        }

        candidates
    }

    /// Keyword test against the JSON-LD job-posting block of a detail
    /// page. An empty keyword list matches everything. A page without a
    /// job-posting block matches nothing; free text on the page is not
    /// consulted.
    pub fn matches_keywords(&self, html: &str, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }

        let document = Html::parse_document(html);
        let block = document
            .select(&self.rules.json_ld)
            .map(|script| script.text().collect::<String>())
            .find(|text| text.contains("\"JobPosting\""));

        let haystack = match block {
            Some(text) => text.to_lowercase(),
            None => return false,
        };

        keywords.iter().any(|keyword| {
            let hit = haystack.contains(&keyword.to_lowercase());
            if hit {
                debug!("Keyword matched: {}", keyword);
            }
            hit
        })
    }
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Price text with thousands separators stripped; anything not purely
/// numeric counts as unknown (0).
fn parse_price(text: &str) -> u64 {
    let cleaned = text.replace(',', "");
    if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
        cleaned.parse().unwrap_or(0)
    } else {
        0
    }
}

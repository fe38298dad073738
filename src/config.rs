use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TARGET_URL: &str = "https://itpropartners.com/job/engineer/python";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_SHEET_PATH: &str = "jobs.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("invalid target URL {0}")]
    InvalidUrl(String),
}

/// Run configuration, built once in `main` and handed to each component.
/// Nothing in the core reads the environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub user_agent: String,
    pub start_page: u32,
    pub max_pages: u32,
    pub timeout: Duration,
    pub request_pause: Duration,
    pub max_retries: u32,
    pub backoff_step: Duration,
    pub keywords: Vec<String>,
    pub sheet_path: PathBuf,
}

impl Config {
    /// Loads configuration from the environment (a local `.env` file is
    /// read first if present). Every key has a working default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_url = env_or("SCRAPE_TARGET_URL", DEFAULT_TARGET_URL);
        let base_url =
            Url::parse(&raw_url).map_err(|_| ConfigError::InvalidUrl(raw_url.clone()))?;

        let keywords = env_or("KEYWORDS", "python")
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        Ok(Config {
            base_url,
            user_agent: env_or("USER_AGENT", DEFAULT_USER_AGENT),
            start_page: parse_env("START_PAGE", 1)?,
            max_pages: parse_env("MAX_PAGES_TO_SCRAPE", 10)?,
            timeout: Duration::from_secs(parse_env("TIMEOUT_SECS", 15)?),
            request_pause: Duration::from_secs(parse_env("SLEEP_SECS", 1)?),
            max_retries: parse_env("MAX_RETRIES", 3)?,
            backoff_step: Duration::from_secs(parse_env("BACKOFF_STEP_SECS", 1)?),
            keywords,
            sheet_path: PathBuf::from(env_or("SHEET_PATH", DEFAULT_SHEET_PATH)),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test owns all env mutation: the harness runs tests on
    // separate threads and `env::set_var` is process-wide.
    #[test]
    fn env_overrides_and_defaults() {
        let config = Config::from_env().unwrap();
        assert!(config.max_pages >= config.start_page);
        assert!(!config.user_agent.is_empty());
        assert_eq!(config.keywords, vec!["python".to_string()]);

        env::set_var("KEYWORDS", "python, django ,");
        let config = Config::from_env().unwrap();
        assert_eq!(config.keywords, vec!["python".to_string(), "django".to_string()]);
        env::remove_var("KEYWORDS");
    }
}

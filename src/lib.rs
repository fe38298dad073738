pub mod config;
pub mod dedup;
pub mod fetcher;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod store;

// Exporting types for convenience
pub use config::Config;
pub use fetcher::{Fetch, FetchError, HttpFetcher};
pub use models::{CandidateRecord, JobEntity};
pub use pipeline::{Pipeline, RunOutcome, RunReport};
pub use processor::{ParseRules, Processor};
pub use store::{CellValue, CsvWorksheet, JobSheet, StoreError, Worksheet};

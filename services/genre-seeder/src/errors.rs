//!
//! src/errors.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines enums and methods of error conversion
//! for errors the seeder and playlist tool use
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeederError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("http status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("schema mismatch: expected [{expected}], found [{found}]")]
    Schema { expected: String, found: String },
    #[error("dataset error: {0}")]
    Dataset(String),
    #[error("strict mode: seeds failed: {0}")]
    StrictSeeds(String),
    #[error("task error: {0}")]
    Task(String),
    #[error("run cancelled")]
    Cancelled,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl From<reqwest::Error> for SeederError {
    fn from(e: reqwest::Error) -> Self { SeederError::Http(e.to_string()) }
}

impl From<serde_json::Error> for SeederError {
    fn from(e: serde_json::Error) -> Self { SeederError::Parse(e.to_string()) }
}

impl From<csv::Error> for SeederError {
    fn from(e: csv::Error) -> Self { SeederError::Dataset(e.to_string()) }
}

pub mod calendar;
pub mod discovery;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// One row of the exchange futures file, before the contract string is parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct FuturesRow {
    pub contract: String,
    pub close: f64,
    pub open_interest: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotQuote {
    pub symbol: String,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorMapping {
    pub symbol: String,
    /// `None` when the sector cell is blank; the row still claims the symbol.
    pub sector: Option<String>,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Could not find {kind} file at {short} or {long}")]
    InputNotFound {
        kind: &'static str,
        short: PathBuf,
        long: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;

//! Trailing averages of Rollover% and Rollover cost taken from the archive of
//! previously generated monthly reports.

use crate::types::MonthYear;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const REPORT_SUFFIX: &str = "_Rollover_Data";

const SYMBOL: &str = "Symbol";
const ROLLOVER_PCT: &str = "Rollover%";
const ROLLOVER_COST: &str = "Rollover cost";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Missing historical report for {period}: expected {path}")]
    MissingPeriod { period: MonthYear, path: PathBuf },
    #[error("Failed to scan archive {path}: {source}")]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to aggregate history: {0}")]
    Aggregate(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoricalAverage {
    pub avg_rollover_pct: f64,
    pub avg_rollover_cost: f64,
}

pub type HistoricalAverages = BTreeMap<String, HistoricalAverage>;

/// Source of per-symbol historical averages for a report period.
pub trait HistorySource {
    fn averages(&self, period: MonthYear) -> Result<HistoricalAverages>;
}

pub fn report_file_name(period: MonthYear, extension: &str) -> String {
    format!("{period}{REPORT_SUFFIX}.{extension}")
}

/// Reads the archived CSV reports of the months preceding the report period.
pub struct HistoricalAverager {
    archive_dir: PathBuf,
    months: usize,
}

impl HistoricalAverager {
    pub fn new(archive_dir: impl Into<PathBuf>, months: usize) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            months,
        }
    }

    /// Periods of every report already written to the archive, oldest first.
    pub fn archived_periods(&self) -> Result<Vec<MonthYear>> {
        if !self.archive_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.archive_dir).map_err(|source| HistoryError::Archive {
            path: self.archive_dir.clone(),
            source,
        })?;
        let suffix = format!("{REPORT_SUFFIX}.csv");
        let periods: BTreeSet<MonthYear> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                MonthYear::parse(name.strip_suffix(&suffix)?).ok()
            })
            .collect();
        Ok(periods.into_iter().collect())
    }

    /// Reports for the months preceding `period`. Months older than the first
    /// archived report are not expected; any gap after it is fatal. Reports for
    /// `period` itself or later never count, so a rerun sees the same history.
    pub fn history_files(&self, period: MonthYear) -> Result<Vec<PathBuf>> {
        let oldest = match self
            .archived_periods()?
            .into_iter()
            .find(|archived| *archived < period)
        {
            Some(oldest) => oldest,
            None => return Ok(Vec::new()),
        };

        period
            .preceding(self.months)
            .into_iter()
            .filter(|month| *month >= oldest)
            .map(|month| {
                let path = self.archive_dir.join(report_file_name(month, "csv"));
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(HistoryError::MissingPeriod {
                        period: month,
                        path,
                    })
                }
            })
            .collect()
    }

    fn load_file(path: &Path) -> PolarsResult<LazyFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        let df = df.select([SYMBOL, ROLLOVER_PCT, ROLLOVER_COST])?;

        Ok(df.lazy().select([
            col(SYMBOL).cast(DataType::String),
            col(ROLLOVER_PCT).cast(DataType::Float64),
            col(ROLLOVER_COST).cast(DataType::Float64),
        ]))
    }

    /// Pools every row of the given files and averages per symbol, so a symbol
    /// seen in fewer files is averaged over those files only.
    pub fn average_files(paths: &[PathBuf]) -> Result<HistoricalAverages> {
        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::load_file(path) {
                Ok(frame) => frames.push(frame),
                Err(error) => {
                    warn!(file = %path.display(), %error, "skipping unreadable historical report")
                }
            }
        }

        if frames.is_empty() {
            warn!("no usable historical data, averages default to 0");
            return Ok(HistoricalAverages::new());
        }

        let pooled = concat(frames, UnionArgs::default())?;
        let averaged = pooled
            .filter(col(SYMBOL).is_not_null())
            .group_by([col(SYMBOL)])
            .agg([
                col(ROLLOVER_PCT).mean().alias("avg_rollover_pct"),
                col(ROLLOVER_COST).mean().alias("avg_rollover_cost"),
            ])
            .collect()?;

        let symbols = averaged.column(SYMBOL)?.str()?;
        let pct = averaged.column("avg_rollover_pct")?.f64()?;
        let cost = averaged.column("avg_rollover_cost")?.f64()?;

        Ok(symbols
            .into_iter()
            .zip(pct.into_iter())
            .zip(cost.into_iter())
            .filter_map(|((symbol, pct), cost)| {
                Some((
                    symbol?.to_string(),
                    HistoricalAverage {
                        avg_rollover_pct: pct.unwrap_or(0.0),
                        avg_rollover_cost: cost.unwrap_or(0.0),
                    },
                ))
            })
            .collect())
    }
}

impl HistorySource for HistoricalAverager {
    fn averages(&self, period: MonthYear) -> Result<HistoricalAverages> {
        let files = self.history_files(period)?;
        if files.is_empty() {
            info!(
                archive = %self.archive_dir.display(),
                period = %period,
                "no earlier reports archived, averages default to 0"
            );
            return Ok(HistoricalAverages::new());
        }

        info!(period = %period, files = files.len(), "averaging historical reports");
        Self::average_files(&files)
    }
}

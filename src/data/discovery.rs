use super::calendar::ReportDates;
use super::{DataError, Result};
use crate::config::PathSettings;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolved input files for one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFiles {
    pub futures: PathBuf,
    pub spot: PathBuf,
    pub prev_spot: PathBuf,
    pub sectors: PathBuf,
}

/// Maps report dates onto the exchange's date-stamped file names.
pub struct InputLocator<'a> {
    paths: &'a PathSettings,
}

impl<'a> InputLocator<'a> {
    pub fn new(paths: &'a PathSettings) -> Self {
        Self { paths }
    }

    pub fn futures(&self, dates: &ReportDates) -> Result<PathBuf> {
        let (short, long) = dates.current_stamps();
        resolve_variant(
            "futures",
            self.paths.futures_dir.join(format!("fo{short}.csv")),
            self.paths.futures_dir.join(format!("fo{long}.csv")),
        )
    }

    pub fn spot(&self, dates: &ReportDates) -> Result<PathBuf> {
        let (short, long) = dates.current_stamps();
        self.bhavcopy("current spot", &short, &long)
    }

    pub fn prev_spot(&self, dates: &ReportDates) -> Result<PathBuf> {
        let (short, long) = dates.previous_stamps();
        self.bhavcopy("previous spot", &short, &long)
    }

    pub fn sectors(&self) -> PathBuf {
        self.paths.sector_file.clone()
    }

    pub fn locate(&self, dates: &ReportDates) -> Result<InputFiles> {
        Ok(InputFiles {
            futures: self.futures(dates)?,
            spot: self.spot(dates)?,
            prev_spot: self.prev_spot(dates)?,
            sectors: self.sectors(),
        })
    }

    fn bhavcopy(&self, kind: &'static str, short: &str, long: &str) -> Result<PathBuf> {
        resolve_variant(
            kind,
            self.paths
                .equity_dir
                .join(format!("sec_bhavdata_full_{short}.csv")),
            self.paths
                .equity_dir
                .join(format!("sec_bhavdata_full_{long}.csv")),
        )
    }
}

/// Returns the first of the two date-format variants that exists on disk.
pub fn resolve_variant(kind: &'static str, short: PathBuf, long: PathBuf) -> Result<PathBuf> {
    for candidate in [&short, &long] {
        if candidate.exists() {
            debug!(kind, path = %candidate.display(), "resolved input file");
            return Ok(candidate.clone());
        }
    }
    Err(DataError::InputNotFound { kind, short, long })
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        tracing::info!(path = %path.display(), "created output folder");
    }
    Ok(())
}

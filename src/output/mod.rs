pub mod table;
pub mod workbook;

use crate::analysis::report::FinalReportRow;
use std::path::PathBuf;
use thiserror::Error;

pub const REPORT_COLUMNS: [&str; 12] = [
    "Sectoral Index",
    "Symbol",
    "Spot",
    "Future Price",
    "Basis",
    "Rollover%",
    "Avg. Roll Over",
    "Rollover cost",
    "Avg. Rollover Cost",
    "Diff Rollover%",
    "Diff Rollover Cost",
    "M_o_M%",
];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, OutputError>;

/// Two decimals, or an empty cell for non-finite values.
pub fn format_number(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        String::new()
    }
}

/// A report row as display strings, in [`REPORT_COLUMNS`] order.
pub fn display_cells(row: &FinalReportRow) -> Vec<String> {
    let mut cells = Vec::with_capacity(REPORT_COLUMNS.len());
    cells.push(row.sector.clone().unwrap_or_default());
    cells.push(row.symbol.clone());
    cells.extend(row.values().into_iter().map(format_number));
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(28.57), "28.57");
        assert_eq!(format_number(5.0), "5.00");
        assert_eq!(format_number(-2.08), "-2.08");
        assert_eq!(format_number(f64::INFINITY), "");
        assert_eq!(format_number(f64::NAN), "");
    }
}

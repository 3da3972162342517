use super::{display_cells, OutputError, Result, REPORT_COLUMNS};
use crate::analysis::report::Report;
use csv::WriterBuilder;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn write_report<W: Write>(report: &Report, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(REPORT_COLUMNS)?;
    for row in &report.rows {
        wtr.write_record(display_cells(row))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes `<Mon><YYYY>_Rollover_Data.csv` into `dir` and returns its path.
pub fn write_csv(report: &Report, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(report.file_name("csv"));
    let file = std::fs::File::create(&path).map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;
    write_report(report, file)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::report::FinalReportRow;
    use crate::types::MonthYear;

    fn row(symbol: &str, sector: Option<&str>, rollover_cost: f64) -> FinalReportRow {
        FinalReportRow {
            sector: sector.map(str::to_string),
            symbol: symbol.to_string(),
            spot: 105.0,
            future_price: 110.0,
            basis: 5.0,
            rollover_pct: 28.57,
            avg_rollover_pct: 20.0,
            rollover_cost,
            avg_rollover_cost: 5.0,
            diff_rollover_pct: 8.57,
            diff_rollover_cost: 4.52,
            mom_pct: 5.0,
        }
    }

    #[test]
    fn test_csv_layout() {
        let report = Report {
            period: MonthYear::new(2025, 8).unwrap(),
            rows: vec![
                row("XYZ", None, f64::NAN),
                row("ABC", Some("NIFTY AUTO"), 9.52),
            ],
        };

        let mut buf = Vec::new();
        write_report(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Sectoral Index,Symbol,Spot,Future Price,Basis,Rollover%,Avg. Roll Over,\
             Rollover cost,Avg. Rollover Cost,Diff Rollover%,Diff Rollover Cost,M_o_M%"
        );
        assert_eq!(lines[1], ",XYZ,105.00,110.00,5.00,28.57,20.00,,5.00,8.57,4.52,5.00");
        assert_eq!(
            lines[2],
            "NIFTY AUTO,ABC,105.00,110.00,5.00,28.57,20.00,9.52,5.00,8.57,4.52,5.00"
        );
        assert_eq!(lines.len(), 3);
    }
}

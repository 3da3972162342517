//! Multi-sheet XLSX rendering of the report: the full table plus one sheet per
//! bucket, each with a colour legend and formula-based row highlighting.

use super::{display_cells, Result, REPORT_COLUMNS};
use crate::analysis::report::{FinalReportRow, Report};
use crate::types::Bucket;
use rust_xlsxwriter::{Color, ConditionalFormatFormula, Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};

pub const FULL_SHEET: &str = "Rollover Data";

/// Legend rows 1-4, header on row 5, data from row 6 (Excel numbering).
const HEADER_ROW: u32 = 4;
const FIRST_DATA_ROW: u32 = HEADER_ROW + 1;
const MAX_COLUMN_WIDTH: usize = 50;
const SECTOR_COLUMN_WIDTH: f64 = 35.0;

fn bucket_format(bucket: Bucket) -> Format {
    let (background, font) = match bucket {
        Bucket::LongRolls => (0xC6EFCE, 0x006100),
        Bucket::ShortRolls => (0xFFC7CE, 0x9C0006),
        Bucket::ShortCovering => (0xEEFBF0, 0x006100),
        Bucket::LongUnwind => (0xFFEBF0, 0x9C0006),
    };
    Format::new()
        .set_background_color(Color::RGB(background))
        .set_font_color(Color::RGB(font))
}

/// Excel formula for a bucket, relative to the first data row. Columns:
/// L = M_o_M%, J = Diff Rollover%, K = Diff Rollover Cost.
pub fn bucket_rule(bucket: Bucket) -> String {
    let cmp = |positive: bool| if positive { ">0" } else { "<0" };
    let (mom, pct, cost) = bucket.signs();
    let row = FIRST_DATA_ROW + 1;
    format!(
        "=AND($L{row}{}, $J{row}{}, $K{row}{})",
        cmp(mom),
        cmp(pct),
        cmp(cost)
    )
}

fn column_widths(rows: &[&FinalReportRow]) -> Vec<f64> {
    let mut widths: Vec<usize> = REPORT_COLUMNS.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(display_cells(row)) {
            *width = (*width).max(cell.len());
        }
    }
    widths
        .into_iter()
        .map(|w| (w + 2).min(MAX_COLUMN_WIDTH) as f64)
        .collect()
}

fn write_sheet(worksheet: &mut Worksheet, name: &str, rows: &[&FinalReportRow]) -> Result<()> {
    worksheet.set_name(name)?;

    for (legend_row, bucket) in Bucket::ALL.into_iter().enumerate() {
        worksheet.write_string_with_format(
            legend_row as u32,
            0,
            bucket.legend(),
            &bucket_format(bucket),
        )?;
    }

    let header = Format::new().set_bold();
    for (col, title) in REPORT_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, col as u16, *title, &header)?;
    }

    let number = Format::new().set_num_format("0.00");
    for (offset, row) in rows.iter().enumerate() {
        let excel_row = FIRST_DATA_ROW + offset as u32;
        if let Some(sector) = &row.sector {
            worksheet.write_string(excel_row, 0, sector.as_str())?;
        }
        worksheet.write_string(excel_row, 1, row.symbol.as_str())?;
        for (idx, value) in row.values().into_iter().enumerate() {
            // non-finite values stay blank
            if value.is_finite() {
                worksheet.write_number_with_format(excel_row, idx as u16 + 2, value, &number)?;
            }
        }
    }

    for (col, width) in column_widths(rows).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }
    worksheet.set_column_width(0, SECTOR_COLUMN_WIDTH)?;
    worksheet.set_freeze_panes(FIRST_DATA_ROW, 2)?;

    if !rows.is_empty() {
        let last_row = FIRST_DATA_ROW + rows.len() as u32 - 1;
        let last_col = REPORT_COLUMNS.len() as u16 - 1;
        for bucket in Bucket::ALL {
            let format = bucket_format(bucket);
            let rule = ConditionalFormatFormula::new()
                .set_rule(bucket_rule(bucket).as_str())
                .set_format(&format);
            worksheet.add_conditional_format(FIRST_DATA_ROW, 0, last_row, last_col, &rule)?;
        }
    }

    Ok(())
}

/// Builds the workbook in memory; sheets are the full table then one per bucket.
pub fn build_workbook(report: &Report) -> Result<Workbook> {
    let mut workbook = Workbook::new();

    let all: Vec<&FinalReportRow> = report.rows.iter().collect();
    write_sheet(workbook.add_worksheet(), FULL_SHEET, &all)?;

    for bucket in Bucket::ALL {
        let rows = report.bucket_rows(bucket);
        write_sheet(workbook.add_worksheet(), bucket.name(), &rows)?;
    }

    Ok(workbook)
}

/// Writes `<Mon><YYYY>_Rollover_Data.xlsx` into `dir` and returns its path.
pub fn write_workbook(report: &Report, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(report.file_name("xlsx"));
    let mut workbook = build_workbook(report)?;
    workbook.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MonthYear;

    fn row(symbol: &str, mom_pct: f64) -> FinalReportRow {
        FinalReportRow {
            sector: Some("NIFTY AUTO".to_string()),
            symbol: symbol.to_string(),
            spot: 105.0,
            future_price: 110.0,
            basis: 5.0,
            rollover_pct: 28.57,
            avg_rollover_pct: 20.0,
            rollover_cost: 9.52,
            avg_rollover_cost: 5.0,
            diff_rollover_pct: 8.57,
            diff_rollover_cost: 4.52,
            mom_pct,
        }
    }

    #[test]
    fn test_bucket_rules_match_legend_signs() {
        assert_eq!(bucket_rule(Bucket::LongRolls), "=AND($L6>0, $J6>0, $K6>0)");
        assert_eq!(bucket_rule(Bucket::ShortRolls), "=AND($L6<0, $J6>0, $K6<0)");
        assert_eq!(bucket_rule(Bucket::ShortCovering), "=AND($L6>0, $J6<0, $K6>0)");
        assert_eq!(bucket_rule(Bucket::LongUnwind), "=AND($L6<0, $J6<0, $K6<0)");
    }

    #[test]
    fn test_column_widths_are_capped() {
        let mut wide = row("ABC", 5.0);
        wide.sector = Some("X".repeat(80));
        let widths = column_widths(&[&wide]);

        assert_eq!(widths.len(), REPORT_COLUMNS.len());
        assert_eq!(widths[0], MAX_COLUMN_WIDTH as f64);
        assert_eq!(widths[1], ("Symbol".len() + 2) as f64);
        assert_eq!(widths[11], ("M_o_M%".len() + 2) as f64);
    }

    #[test]
    fn test_workbook_saves_with_empty_buckets() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = Report {
            period: MonthYear::new(2025, 8).unwrap(),
            rows: vec![row("ABC", 5.0), row("FLAT", 0.0)],
        };

        let path = write_workbook(&report, dir.path()).unwrap();

        assert!(path.ends_with("Aug2025_Rollover_Data.xlsx"));
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}

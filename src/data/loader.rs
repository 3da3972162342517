use super::{DataError, FuturesRow, Result, SectorMapping, SpotQuote};
use crate::config::ColumnSettings;
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::warn;

pub struct DataLoader;

impl DataLoader {
    /// Resolves each required column to its index, case-insensitively.
    fn verify_required_columns<const N: usize>(
        path: &Path,
        headers: &StringRecord,
        required: [&str; N],
    ) -> Result<[usize; N]> {
        let mut indices = [0usize; N];
        for (slot, column) in indices.iter_mut().zip(required) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(column))
                .ok_or_else(|| DataError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })?;
        }
        Ok(indices)
    }

    fn read_records<P: AsRef<Path>>(path: P) -> Result<(StringRecord, Vec<StringRecord>)> {
        let path = path.as_ref();
        let csv_err = |source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = rdr.headers().map_err(csv_err)?.clone();
        let records = rdr
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(csv_err)?;
        Ok((headers, records))
    }

    /// Loads the futures table. Rows whose price or open interest do not parse
    /// are skipped; contract strings are left for the contract parser.
    pub fn load_futures<P: AsRef<Path>>(
        path: P,
        columns: &ColumnSettings,
    ) -> Result<Vec<FuturesRow>> {
        let path = path.as_ref();
        let (headers, records) = Self::read_records(path)?;
        let [contract_idx, close_idx, oi_idx] = Self::verify_required_columns(
            path,
            &headers,
            [
                columns.contract.as_str(),
                columns.futures_close.as_str(),
                columns.open_interest.as_str(),
            ],
        )?;

        let mut rows = Vec::with_capacity(records.len());
        for (line, record) in records.iter().enumerate() {
            let contract = record.get(contract_idx).unwrap_or_default();
            let close = record.get(close_idx).and_then(parse_price);
            let open_interest = record.get(oi_idx).and_then(parse_open_interest);

            match (close, open_interest) {
                (Some(close), Some(open_interest)) => rows.push(FuturesRow {
                    contract: contract.to_string(),
                    close,
                    open_interest,
                }),
                _ => warn!(
                    file = %path.display(),
                    line = line + 2,
                    contract,
                    "skipping futures row with unparseable price or open interest"
                ),
            }
        }

        Ok(rows)
    }

    pub fn load_spot<P: AsRef<Path>>(path: P, columns: &ColumnSettings) -> Result<Vec<SpotQuote>> {
        let path = path.as_ref();
        let (headers, records) = Self::read_records(path)?;
        let [symbol_idx, close_idx] = Self::verify_required_columns(
            path,
            &headers,
            [columns.spot_symbol.as_str(), columns.spot_close.as_str()],
        )?;

        let mut quotes = Vec::with_capacity(records.len());
        for (line, record) in records.iter().enumerate() {
            let symbol = record.get(symbol_idx).unwrap_or_default();
            match record.get(close_idx).and_then(parse_price) {
                Some(close) if !symbol.is_empty() => quotes.push(SpotQuote {
                    symbol: symbol.to_string(),
                    close,
                }),
                _ => warn!(
                    file = %path.display(),
                    line = line + 2,
                    symbol,
                    "skipping spot row with missing symbol or unparseable close"
                ),
            }
        }

        Ok(quotes)
    }

    pub fn load_sectors<P: AsRef<Path>>(
        path: P,
        columns: &ColumnSettings,
    ) -> Result<Vec<SectorMapping>> {
        let path = path.as_ref();
        let (headers, records) = Self::read_records(path)?;
        let [symbol_idx, sector_idx] = Self::verify_required_columns(
            path,
            &headers,
            [columns.sector_symbol.as_str(), columns.sector_name.as_str()],
        )?;

        Ok(records
            .iter()
            .filter_map(|record| {
                let symbol = record.get(symbol_idx)?;
                let sector = record.get(sector_idx).unwrap_or_default();
                (!symbol.is_empty()).then(|| SectorMapping {
                    symbol: symbol.to_string(),
                    sector: (!sector.is_empty()).then(|| sector.to_string()),
                })
            })
            .collect())
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

// Some exchange dumps write open interest as `1200.0`.
fn parse_open_interest(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_futures_skips_bad_numbers() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "fo.csv",
            "INSTRUMENT, CONTRACT_D, CLOSE_PRIC, OI_NO_CON\n\
             FUTSTK, FUTSTKABC28-AUG-2025, 100.5, 1200\n\
             FUTSTK, FUTSTKABC25-SEP-2025, -, 10\n\
             FUTSTK, FUTSTKXYZ28-AUG-2025, 42, 300.0\n",
        );

        let rows = DataLoader::load_futures(&path, &ColumnSettings::default()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].contract, "FUTSTKABC28-AUG-2025");
        assert_eq!(rows[0].close, 100.5);
        assert_eq!(rows[0].open_interest, 1200);
        assert_eq!(rows[1].open_interest, 300);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "spot.csv", "SYMBOL,OPEN_PRICE\nABC,10\n");

        let err = DataLoader::load_spot(&path, &ColumnSettings::default()).unwrap_err();
        match err {
            DataError::MissingColumn { column, .. } => assert_eq!(column, "CLOSE_PRICE"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_sectors_keeps_blank_sectors() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "index.csv",
            "Symbol,Sectoral Index\nABC,NIFTY AUTO\nXYZ,\n,NIFTY IT\nXYZ,NIFTY IT\n",
        );

        let sectors = DataLoader::load_sectors(&path, &ColumnSettings::default()).unwrap();
        assert_eq!(
            sectors,
            vec![
                SectorMapping {
                    symbol: "ABC".to_string(),
                    sector: Some("NIFTY AUTO".to_string()),
                },
                SectorMapping {
                    symbol: "XYZ".to_string(),
                    sector: None,
                },
                SectorMapping {
                    symbol: "XYZ".to_string(),
                    sector: Some("NIFTY IT".to_string()),
                },
            ]
        );
    }
}

use super::classifier::classify;
use super::history::{report_file_name, HistoricalAverage, HistoryError};
use super::join::Keyed;
use super::metrics::MetricRow;
use crate::types::{Bucket, MonthYear};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("History error: {0}")]
    History(#[from] HistoryError),
    #[error("Nothing to report: {0}")]
    EmptyReport(&'static str),
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Clone, PartialEq)]
pub struct FinalReportRow {
    pub sector: Option<String>,
    pub symbol: String,
    pub spot: f64,
    pub future_price: f64,
    pub basis: f64,
    pub rollover_pct: f64,
    pub avg_rollover_pct: f64,
    pub rollover_cost: f64,
    pub avg_rollover_cost: f64,
    pub diff_rollover_pct: f64,
    pub diff_rollover_cost: f64,
    pub mom_pct: f64,
}

impl Keyed for FinalReportRow {
    fn key(&self) -> &str {
        &self.symbol
    }
}

impl FinalReportRow {
    pub fn new(row: MetricRow, history: HistoricalAverage) -> Self {
        Self {
            diff_rollover_pct: row.rollover_pct - history.avg_rollover_pct,
            diff_rollover_cost: row.rollover_cost - history.avg_rollover_cost,
            avg_rollover_pct: history.avg_rollover_pct,
            avg_rollover_cost: history.avg_rollover_cost,
            sector: row.sector,
            symbol: row.symbol,
            spot: row.spot,
            future_price: row.future_price,
            basis: row.basis,
            rollover_pct: row.rollover_pct,
            rollover_cost: row.rollover_cost,
            mom_pct: row.mom_pct,
        }
    }

    /// Numeric fields in report column order (after sector and symbol).
    pub fn values(&self) -> [f64; 10] {
        [
            self.spot,
            self.future_price,
            self.basis,
            self.rollover_pct,
            self.avg_rollover_pct,
            self.rollover_cost,
            self.avg_rollover_cost,
            self.diff_rollover_pct,
            self.diff_rollover_cost,
            self.mom_pct,
        ]
    }

    pub fn non_finite_fields(&self) -> Vec<&'static str> {
        const NAMES: [&str; 10] = [
            "spot",
            "future_price",
            "basis",
            "rollover_pct",
            "avg_rollover_pct",
            "rollover_cost",
            "avg_rollover_cost",
            "diff_rollover_pct",
            "diff_rollover_cost",
            "mom_pct",
        ];
        NAMES
            .into_iter()
            .zip(self.values())
            .filter(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_flagged(&self) -> bool {
        self.values().iter().any(|v| !v.is_finite())
    }

    /// Flagged rows never classify.
    pub fn bucket(&self) -> Option<Bucket> {
        if self.is_flagged() {
            return None;
        }
        classify(self.mom_pct, self.diff_rollover_pct, self.diff_rollover_cost)
    }

    fn rounded(self) -> Self {
        Self {
            spot: round2(self.spot),
            future_price: round2(self.future_price),
            basis: round2(self.basis),
            rollover_pct: round2(self.rollover_pct),
            avg_rollover_pct: round2(self.avg_rollover_pct),
            rollover_cost: round2(self.rollover_cost),
            avg_rollover_cost: round2(self.avg_rollover_cost),
            diff_rollover_pct: round2(self.diff_rollover_pct),
            diff_rollover_cost: round2(self.diff_rollover_cost),
            mom_pct: round2(self.mom_pct),
            ..self
        }
    }
}

/// Rounds to two decimals, half away from zero, so an exact binary half such
/// as 0.125 becomes 0.13 rather than the half-to-even 0.12. Non-finite values
/// pass through.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Most frequent month; ties go to the earliest month.
pub fn majority_month(months: impl IntoIterator<Item = MonthYear>) -> Option<MonthYear> {
    let mut counts: BTreeMap<MonthYear, usize> = BTreeMap::new();
    for month in months {
        *counts.entry(month).or_default() += 1;
    }

    let mut best: Option<(MonthYear, usize)> = None;
    for (month, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((month, count));
        }
    }
    best.map(|(month, _)| month)
}

/// The finished, sorted and rounded report for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub period: MonthYear,
    pub rows: Vec<FinalReportRow>,
}

impl Report {
    /// Sorts by (sector, symbol) with a blank sector sorting as "", then rounds.
    pub fn assemble(period: MonthYear, mut rows: Vec<FinalReportRow>) -> Self {
        rows.sort_by(|a, b| {
            let a_key = (a.sector.as_deref().unwrap_or(""), a.symbol.as_str());
            let b_key = (b.sector.as_deref().unwrap_or(""), b.symbol.as_str());
            a_key.cmp(&b_key)
        });

        Self {
            period,
            rows: rows.into_iter().map(FinalReportRow::rounded).collect(),
        }
    }

    pub fn bucket_rows(&self, bucket: Bucket) -> Vec<&FinalReportRow> {
        self.rows
            .iter()
            .filter(|row| row.bucket() == Some(bucket))
            .collect()
    }

    pub fn flagged_rows(&self) -> Vec<&FinalReportRow> {
        self.rows.iter().filter(|row| row.is_flagged()).collect()
    }

    pub fn file_name(&self, extension: &str) -> String {
        report_file_name(self.period, extension)
    }
}

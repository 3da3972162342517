use super::join::{Keyed, Lookup, OptionalJoin, RequiredJoin};
use super::rollover::RolloverRow;

impl Keyed for RolloverRow {
    fn key(&self) -> &str {
        &self.symbol
    }
}

/// A rollover row with its current-period spot attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotRow {
    pub rollover: RolloverRow,
    pub spot: f64,
}

impl Keyed for SpotRow {
    fn key(&self) -> &str {
        &self.rollover.symbol
    }
}

/// A rollover row with both spot prices attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedRow {
    pub rollover: RolloverRow,
    pub spot: f64,
    pub prev_spot: f64,
}

impl Keyed for PricedRow {
    fn key(&self) -> &str {
        &self.rollover.symbol
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub rollover: RolloverRow,
    pub spot: f64,
    pub prev_spot: f64,
    pub sector: Option<String>,
}

/// Attaches current spot, previous spot and sector. Both spot sources are
/// required; the sector is optional, and a blank sector entry still wins over
/// later entries for the same symbol.
pub fn join_sources(
    rows: Vec<RolloverRow>,
    spot: &Lookup<f64>,
    prev_spot: &Lookup<f64>,
    sectors: &Lookup<Option<String>>,
) -> Vec<JoinedRow> {
    let with_spot = RequiredJoin::apply(rows, spot, |rollover, &spot| SpotRow { rollover, spot });
    let priced = RequiredJoin::apply(with_spot, prev_spot, |row, &prev_spot| PricedRow {
        rollover: row.rollover,
        spot: row.spot,
        prev_spot,
    });
    OptionalJoin::apply(priced, sectors, |row, sector| JoinedRow {
        rollover: row.rollover,
        spot: row.spot,
        prev_spot: row.prev_spot,
        sector: sector.cloned().flatten(),
    })
}

/// Per-symbol figures once spot prices are known. The cost numerator,
/// current close and previous spot are consumed here.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub symbol: String,
    pub sector: Option<String>,
    pub spot: f64,
    pub future_price: f64,
    pub basis: f64,
    pub rollover_pct: f64,
    pub rollover_cost: f64,
    pub mom_pct: f64,
}

impl Keyed for MetricRow {
    fn key(&self) -> &str {
        &self.symbol
    }
}

impl MetricRow {
    /// Zero spot or previous spot is not guarded; the resulting non-finite
    /// values are flagged downstream.
    pub fn derive(row: JoinedRow) -> Self {
        let JoinedRow {
            rollover,
            spot,
            prev_spot,
            sector,
        } = row;

        Self {
            basis: rollover.future_price - spot,
            rollover_cost: rollover.cost_numerator / spot * 100.0,
            mom_pct: (spot - prev_spot) / prev_spot * 100.0,
            symbol: rollover.symbol,
            sector,
            spot,
            future_price: rollover.future_price,
            rollover_pct: rollover.rollover_pct,
        }
    }
}

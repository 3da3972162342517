use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ContractRecord {
    pub symbol: String,
    pub expiry: NaiveDate,
    pub close: f64,
    pub open_interest: i64,
}

#[derive(Debug, Error, PartialEq)]
#[error("{symbol}: {available} contract month(s) available, at least 2 required")]
pub struct InsufficientTenors {
    pub symbol: String,
    pub available: usize,
}

/// All contracts of one symbol ordered by expiry. Construction guarantees at
/// least two tenors, so `current` and `next` always exist.
#[derive(Debug, Clone)]
pub struct SymbolContractGroup {
    symbol: String,
    contracts: Vec<ContractRecord>,
}

impl SymbolContractGroup {
    pub fn new(
        symbol: impl Into<String>,
        mut contracts: Vec<ContractRecord>,
    ) -> Result<Self, InsufficientTenors> {
        let symbol = symbol.into();
        if contracts.len() < 2 {
            return Err(InsufficientTenors {
                symbol,
                available: contracts.len(),
            });
        }
        contracts.sort_by_key(|c| c.expiry);
        Ok(Self { symbol, contracts })
    }

    /// Groups records by symbol. Symbols come out in ascending order.
    pub fn group_by_symbol(
        records: impl IntoIterator<Item = ContractRecord>,
    ) -> BTreeMap<String, Vec<ContractRecord>> {
        let mut grouped: BTreeMap<String, Vec<ContractRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.symbol.clone()).or_default().push(record);
        }
        grouped
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn current(&self) -> &ContractRecord {
        &self.contracts[0]
    }

    pub fn next(&self) -> &ContractRecord {
        &self.contracts[1]
    }

    /// Next-to-next month, when listed.
    pub fn far(&self) -> Option<&ContractRecord> {
        self.contracts.get(2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RolloverRow {
    pub symbol: String,
    /// Next-month close.
    pub future_price: f64,
    pub rollover_pct: f64,
    /// Next minus current close; divided by spot once spot is known.
    pub cost_numerator: f64,
    pub current_close: f64,
}

pub struct RolloverCalculator;

impl RolloverCalculator {
    pub fn compute(group: &SymbolContractGroup) -> RolloverRow {
        let current = group.current();
        let next = group.next();

        RolloverRow {
            symbol: group.symbol().to_string(),
            future_price: next.close,
            rollover_pct: Self::rollover_pct(
                current.open_interest,
                next.open_interest,
                group.far().map_or(0, |c| c.open_interest),
            ),
            cost_numerator: next.close - current.close,
            current_close: current.close,
        }
    }

    /// Share of open interest already carried into later months. Zero total
    /// open interest means no rollover signal. Summed in f64 so no input
    /// can overflow.
    pub fn rollover_pct(current_oi: i64, next_oi: i64, far_oi: i64) -> f64 {
        let rolled = next_oi as f64 + far_oi as f64;
        let total = current_oi as f64 + rolled;
        if total == 0.0 {
            return 0.0;
        }
        rolled / total * 100.0
    }
}

use crate::analysis::contract::{parse_contract, ContractId};
use crate::analysis::history::HistorySource;
use crate::analysis::join::{Lookup, OptionalJoin};
use crate::analysis::metrics::{join_sources, MetricRow};
use crate::analysis::report::{majority_month, FinalReportRow, Report, ReportError, Result};
use crate::analysis::rollover::{
    ContractRecord, RolloverCalculator, RolloverRow, SymbolContractGroup,
};
use crate::data::{FuturesRow, SectorMapping, SpotQuote};
use crate::types::MonthYear;
use tracing::{debug, info, info_span, warn};

/// Everything the report needs, already read from disk.
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub futures: Vec<FuturesRow>,
    pub spot: Vec<SpotQuote>,
    pub prev_spot: Vec<SpotQuote>,
    pub sectors: Vec<SectorMapping>,
}

/// Rollover rows plus the current-contract month of each symbol.
#[derive(Debug, Clone)]
pub struct RolloverBatch {
    pub rows: Vec<RolloverRow>,
    pub current_months: Vec<MonthYear>,
}

pub fn parse_contracts(rows: &[FuturesRow]) -> Vec<ContractRecord> {
    let mut unrecognized = 0usize;
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        match parse_contract(&row.contract) {
            ContractId::Parsed { symbol, expiry } => records.push(ContractRecord {
                symbol,
                expiry,
                close: row.close,
                open_interest: row.open_interest,
            }),
            ContractId::BadDate { symbol, date } => {
                warn!(contract = %row.contract, %symbol, %date, "could not parse contract date, row dropped")
            }
            ContractId::Unrecognized => {
                debug!(contract = %row.contract, "not a FUTSTK<SYMBOL><DD-MMM-YYYY> contract");
                unrecognized += 1;
            }
        }
    }

    if unrecognized > 0 {
        warn!(
            rows = unrecognized,
            "dropped rows whose contract does not match FUTSTK<SYMBOL><DD-MMM-YYYY>"
        );
    }
    records
}

pub fn compute_rollovers(records: Vec<ContractRecord>) -> RolloverBatch {
    let mut rows = Vec::new();
    let mut current_months = Vec::new();

    for (symbol, contracts) in SymbolContractGroup::group_by_symbol(records) {
        match SymbolContractGroup::new(symbol, contracts) {
            Ok(group) => {
                current_months.push(MonthYear::from_date(group.current().expiry));
                rows.push(RolloverCalculator::compute(&group));
            }
            Err(skip) => warn!(symbol = %skip.symbol, available = skip.available, "skipping symbol: {skip}"),
        }
    }

    RolloverBatch {
        rows,
        current_months,
    }
}

fn quote_lookup(source: &'static str, quotes: Vec<SpotQuote>) -> Lookup<f64> {
    Lookup::first_wins(source, quotes.into_iter().map(|q| (q.symbol, q.close)))
}

pub struct RolloverPipeline<'a, H: HistorySource> {
    history: &'a H,
}

impl<'a, H: HistorySource> RolloverPipeline<'a, H> {
    pub fn new(history: &'a H) -> Self {
        Self { history }
    }

    pub fn run(&self, inputs: ReportInputs) -> Result<Report> {
        let ReportInputs {
            futures,
            spot,
            prev_spot,
            sectors,
        } = inputs;

        let records = {
            let _stage = info_span!("stage", stage = "parse").entered();
            let records = parse_contracts(&futures);
            info!(rows = futures.len(), contracts = records.len(), "parsed futures");
            records
        };
        if records.is_empty() {
            return Err(ReportError::EmptyReport("no valid stock futures contracts"));
        }

        let batch = {
            let _stage = info_span!("stage", stage = "rollover").entered();
            let batch = compute_rollovers(records);
            info!(symbols = batch.rows.len(), "computed rollover");
            batch
        };
        let period = majority_month(batch.current_months.iter().copied())
            .ok_or(ReportError::EmptyReport("no symbol has two contract months"))?;
        info!(period = %period, "report period from current contract month");

        let metric_rows = {
            let _stage = info_span!("stage", stage = "join").entered();
            let spot = quote_lookup("spot", spot);
            let prev_spot = quote_lookup("prev_spot", prev_spot);
            let sectors = Lookup::first_wins(
                "sectors",
                sectors.into_iter().map(|m| (m.symbol, m.sector)),
            );
            let joined = join_sources(batch.rows, &spot, &prev_spot, &sectors);
            info!(rows = joined.len(), "joined spot, previous spot and sectors");
            joined.into_iter().map(MetricRow::derive).collect::<Vec<_>>()
        };
        if metric_rows.is_empty() {
            return Err(ReportError::EmptyReport("no symbol has spot and previous spot prices"));
        }

        let rows = {
            let _stage = info_span!("stage", stage = "history").entered();
            let averages = self.history.averages(period)?;
            info!(symbols = averages.len(), "loaded historical averages");
            let history = Lookup::first_wins("history", averages);
            OptionalJoin::apply(metric_rows, &history, |row, avg| {
                FinalReportRow::new(row, avg.copied().unwrap_or_default())
            })
        };

        let _stage = info_span!("stage", stage = "assemble").entered();
        let report = Report::assemble(period, rows);
        for row in report.flagged_rows() {
            warn!(
                symbol = %row.symbol,
                fields = ?row.non_finite_fields(),
                "non-finite metrics, row left unclassified"
            );
        }
        info!(
            rows = report.rows.len(),
            flagged = report.flagged_rows().len(),
            "report assembled"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::history::{HistoricalAverage, HistoricalAverages};
    use crate::types::Bucket;

    struct FixedHistory(HistoricalAverages);

    impl HistorySource for FixedHistory {
        fn averages(
            &self,
            _period: MonthYear,
        ) -> crate::analysis::history::Result<HistoricalAverages> {
            Ok(self.0.clone())
        }
    }

    fn futures(contract: &str, close: f64, open_interest: i64) -> FuturesRow {
        FuturesRow {
            contract: contract.to_string(),
            close,
            open_interest,
        }
    }

    fn quote(symbol: &str, close: f64) -> SpotQuote {
        SpotQuote {
            symbol: symbol.to_string(),
            close,
        }
    }

    fn inputs() -> ReportInputs {
        ReportInputs {
            futures: vec![
                futures("FUTSTKABC28-OCT-2025", 120.0, 30),
                futures("FUTSTKABC28-AUG-2025", 100.0, 200),
                futures("FUTSTKABC30-SEP-2025", 110.0, 50),
                futures("FUTSTKLONE28-AUG-2025", 10.0, 10),
                futures("OPTSTKABC28-AUG-2025CE100", 1.0, 1),
            ],
            spot: vec![quote("ABC", 105.0), quote("LONE", 10.0)],
            prev_spot: vec![quote("ABC", 100.0)],
            sectors: vec![],
        }
    }

    #[test]
    fn test_worked_example_end_to_end() {
        let history = FixedHistory(HistoricalAverages::from([(
            "ABC".to_string(),
            HistoricalAverage {
                avg_rollover_pct: 20.0,
                avg_rollover_cost: 5.0,
            },
        )]));

        let report = RolloverPipeline::new(&history).run(inputs()).unwrap();

        assert_eq!(report.period.to_string(), "Aug2025");
        assert_eq!(report.rows.len(), 1);
        let abc = &report.rows[0];
        assert_eq!(abc.sector, None);
        assert_eq!(abc.future_price, 110.0);
        assert_eq!(abc.basis, 5.0);
        assert_eq!(abc.rollover_pct, 28.57);
        assert_eq!(abc.rollover_cost, 9.52);
        assert_eq!(abc.mom_pct, 5.0);
        assert_eq!(abc.diff_rollover_pct, 8.57);
        assert_eq!(report.bucket_rows(Bucket::LongRolls).len(), 1);
    }

    #[test]
    fn test_no_history_defaults_to_zero() {
        let report = RolloverPipeline::new(&FixedHistory(HistoricalAverages::new()))
            .run(inputs())
            .unwrap();

        let abc = &report.rows[0];
        assert_eq!(abc.avg_rollover_pct, 0.0);
        assert_eq!(abc.avg_rollover_cost, 0.0);
        assert_eq!(abc.diff_rollover_cost, abc.rollover_cost);
    }

    #[test]
    fn test_empty_inputs_abort() {
        let history = FixedHistory(HistoricalAverages::new());
        let err = RolloverPipeline::new(&history)
            .run(ReportInputs::default())
            .unwrap_err();
        assert!(matches!(err, ReportError::EmptyReport(_)));

        let mut no_spot = inputs();
        no_spot.spot.clear();
        let err = RolloverPipeline::new(&history).run(no_spot).unwrap_err();
        assert!(matches!(err, ReportError::EmptyReport(_)));
    }

    #[test]
    fn test_zero_spot_row_is_kept_and_flagged() {
        let mut zero = inputs();
        zero.spot = vec![quote("ABC", 0.0)];

        let report = RolloverPipeline::new(&FixedHistory(HistoricalAverages::new()))
            .run(zero)
            .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert!(report.rows[0].is_flagged());
        assert_eq!(report.rows[0].bucket(), None);
    }
}

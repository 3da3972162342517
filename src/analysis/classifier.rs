use crate::types::Bucket;

/// Sign of a value under strict comparison: zero and non-finite values have none.
fn sign(value: f64) -> Option<bool> {
    if !value.is_finite() || value == 0.0 {
        None
    } else {
        Some(value > 0.0)
    }
}

/// Picks the bucket whose sign triple matches, if any. Buckets differ in at
/// least one sign, so at most one can match.
pub fn classify(mom_pct: f64, diff_rollover_pct: f64, diff_rollover_cost: f64) -> Option<Bucket> {
    let signs = (
        sign(mom_pct)?,
        sign(diff_rollover_pct)?,
        sign(diff_rollover_cost)?,
    );
    Bucket::ALL.into_iter().find(|bucket| bucket.signs() == signs)
}

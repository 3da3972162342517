//! Symbol-keyed joins between the rollover rows and the auxiliary tables.
//!
//! Two policies exist and each call site names the one it uses:
//! - [`RequiredJoin`]: rows without a match are dropped (inner join).
//! - [`OptionalJoin`]: rows without a match are kept with `None` (left join).

use std::collections::HashMap;
use tracing::debug;

pub trait Keyed {
    fn key(&self) -> &str;
}

/// Right-hand side of a join, one value per symbol.
#[derive(Debug, Clone)]
pub struct Lookup<V> {
    source: &'static str,
    entries: HashMap<String, V>,
}

impl<V> Lookup<V> {
    /// Builds the lookup keeping the first value seen for each symbol.
    pub fn first_wins(source: &'static str, pairs: impl IntoIterator<Item = (String, V)>) -> Self {
        let mut entries = HashMap::new();
        let mut duplicates = 0usize;
        for (symbol, value) in pairs {
            if entries.contains_key(&symbol) {
                duplicates += 1;
                continue;
            }
            entries.insert(symbol, value);
        }
        if duplicates > 0 {
            debug!(source, duplicates, "ignored duplicate symbols");
        }
        Self { source, entries }
    }

    pub fn get(&self, symbol: &str) -> Option<&V> {
        self.entries.get(symbol)
    }

}

pub struct RequiredJoin;

impl RequiredJoin {
    pub fn apply<L, V, O>(
        left: Vec<L>,
        right: &Lookup<V>,
        mut combine: impl FnMut(L, &V) -> O,
    ) -> Vec<O>
    where
        L: Keyed,
    {
        let before = left.len();
        let joined: Vec<O> = left
            .into_iter()
            .filter_map(|row| match right.get(row.key()) {
                Some(value) => Some(combine(row, value)),
                None => {
                    debug!(source = right.source, symbol = row.key(), "no match, excluded");
                    None
                }
            })
            .collect();
        debug!(
            source = right.source,
            kept = joined.len(),
            dropped = before - joined.len(),
            "required join"
        );
        joined
    }
}

pub struct OptionalJoin;

impl OptionalJoin {
    pub fn apply<L, V, O>(
        left: Vec<L>,
        right: &Lookup<V>,
        mut combine: impl FnMut(L, Option<&V>) -> O,
    ) -> Vec<O>
    where
        L: Keyed,
    {
        let mut unmatched = 0usize;
        let joined: Vec<O> = left
            .into_iter()
            .map(|row| {
                let value = right.get(row.key());
                if value.is_none() {
                    unmatched += 1;
                }
                combine(row, value)
            })
            .collect();
        debug!(
            source = right.source,
            rows = joined.len(),
            unmatched,
            "optional join"
        );
        joined
    }
}

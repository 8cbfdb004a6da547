//! Pure operations over rate observations.

use std::collections::BTreeMap;

use super::Rate;

/// Latest rate per pair, given observations ordered newest first.
pub fn latest_rates<'a>(newest_first: impl IntoIterator<Item = &'a Rate>) -> BTreeMap<String, String> {
    let mut latest = BTreeMap::new();
    for rate in newest_first {
        latest
            .entry(rate.pair.clone())
            .or_insert_with(|| rate.rate.clone());
    }
    latest
}

/// Keeps observations for `pair`, or all of them when no pair is given.
pub fn filter_by_pair(rates: Vec<Rate>, pair: Option<&str>) -> Vec<Rate> {
    match pair {
        Some(pair) => rates.into_iter().filter(|r| r.pair == pair).collect(),
        None => rates,
    }
}

//! Single-pass stratification (spec.md §4.7): scope, service, sex, age-group,
//! sample category, and the sex×age cross. Generic over the stratum key so
//! the six dimensions in `aggregate::mod` share one grouping routine.

use std::collections::BTreeMap;

use crate::entities::Interpretation;

use super::SirCounts;

/// Minimum stratum size below which a row is dropped from the report, unless
/// the caller's `bypass_min` predicate opts it out (spec.md §4.7: a sample
/// category's `ignore_min` overlay).
pub const MIN_STRATUM_N: usize = 30;

/// Groups `(key, interpretation)` pairs by key, tallies S/I/R per group, and
/// drops groups under `MIN_STRATUM_N` unless `bypass_min(key)` is true.
pub fn stratify<K: Ord + Clone>(entries: &[(K, Interpretation)], bypass_min: impl Fn(&K) -> bool) -> Vec<(K, SirCounts)> {
    let mut grouped: BTreeMap<K, SirCounts> = BTreeMap::new();
    for (key, interpretation) in entries {
        grouped.entry(key.clone()).or_default().add(*interpretation);
    }
    grouped.into_iter().filter(|(key, counts)| bypass_min(key) || counts.total() >= MIN_STRATUM_N).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strata_under_the_floor_are_dropped_by_default() {
        let entries = vec![("A".to_string(), Interpretation::S), ("A".to_string(), Interpretation::R)];
        let rows = stratify(&entries, |_| false);
        assert!(rows.is_empty());
    }

    #[test]
    fn bypass_min_keeps_a_small_stratum() {
        let entries = vec![("A".to_string(), Interpretation::S), ("A".to_string(), Interpretation::R)];
        let rows = stratify(&entries, |_| true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.total(), 2);
    }

    #[test]
    fn a_stratum_at_or_above_the_floor_is_kept() {
        let entries: Vec<(String, Interpretation)> = (0..30).map(|_| ("A".to_string(), Interpretation::S)).collect();
        let rows = stratify(&entries, |_| false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.s, 30);
    }
}

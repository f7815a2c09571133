//! Removal of customers that never reach the checkout.
//!
//! Some customers are still in the store when it closes. Their trajectory has
//! no exit, so they are dropped entirely rather than truncated.

use std::collections::{HashMap, HashSet};

use market_core::models::{AnnotatedRecord, CustomerNo, FilteredRecord, TaggedRow};
use tracing::debug;

/// Keep only customers whose last row (by timestamp) is an exit.
///
/// The input is re-sorted by timestamp with a stable sort; among rows sharing
/// the final timestamp the one latest in that order counts as the last. All
/// rows of a customer whose last row is not an exit are discarded; the rest
/// keep their relative order.
pub fn filter_non_exiting_customers(rows: &[AnnotatedRecord]) -> Vec<FilteredRecord> {
    retain_exiting(rows)
        .into_iter()
        .map(FilteredRecord::from_verified)
        .collect()
}

/// Apply the same rule to rows that have already been filtered.
///
/// Always returns an identical table; useful when rows from separately
/// filtered sources are combined.
pub fn refilter(rows: &[FilteredRecord]) -> Vec<FilteredRecord> {
    retain_exiting(rows)
        .into_iter()
        .map(FilteredRecord::from_verified)
        .collect()
}

/// Customers whose last row is not an exit.
pub fn non_exiting_customers<R: TaggedRow>(rows: &[R]) -> HashSet<CustomerNo> {
    let sorted = sorted_by_time(rows);

    // Later rows overwrite earlier ones, so each customer ends up mapped to the
    // exit flag of their final row.
    let mut last_is_exit: HashMap<&CustomerNo, bool> = HashMap::new();
    for row in sorted {
        last_is_exit.insert(row.customer_no(), row.is_exit());
    }

    last_is_exit
        .into_iter()
        .filter(|(_, exit)| !exit)
        .map(|(customer, _)| customer.clone())
        .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn sorted_by_time<R: TaggedRow>(rows: &[R]) -> Vec<&R> {
    let mut sorted: Vec<&R> = rows.iter().collect();
    sorted.sort_by_key(|r| r.timestamp());
    sorted
}

fn retain_exiting<R: TaggedRow>(rows: &[R]) -> Vec<AnnotatedRecord> {
    let invalid = non_exiting_customers(rows);

    let kept: Vec<AnnotatedRecord> = sorted_by_time(rows)
        .into_iter()
        .filter(|r| !invalid.contains(r.customer_no()))
        .map(|r| r.annotated().clone())
        .collect();

    debug!(
        "Exit filter: kept {} of {} rows, dropped {} customers",
        kept.len(),
        rows.len(),
        invalid.len()
    );

    kept
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::add_entry_exit;
    use chrono::{NaiveDate, NaiveDateTime};
    use market_core::models::{Location, ScanRecord};

    fn ts(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 9, 2)
            .unwrap()
            .and_hms_opt(21, m, 0)
            .unwrap()
    }

    fn tagged(rows: &[(u32, &str, Location)]) -> Vec<AnnotatedRecord> {
        add_entry_exit(
            rows.iter()
                .map(|(m, c, l)| ScanRecord::new(ts(*m), *c, *l))
                .collect(),
        )
    }

    fn customers(rows: &[FilteredRecord]) -> Vec<&str> {
        rows.iter().map(|r| r.customer_no().as_str()).collect()
    }

    #[test]
    fn test_drops_customer_without_checkout() {
        let rows = tagged(&[
            (1, "1", Location::Dairy),
            (2, "2", Location::Fruit),
            (3, "1", Location::Checkout),
            (4, "2", Location::Spices),
        ]);
        let filtered = filter_non_exiting_customers(&rows);
        assert_eq!(customers(&filtered), vec!["1", "1"]);
    }

    #[test]
    fn test_single_scan_customer_is_dropped() {
        let rows = tagged(&[
            (1, "solo", Location::Dairy),
            (2, "1", Location::Drinks),
            (3, "1", Location::Checkout),
        ]);
        let filtered = filter_non_exiting_customers(&rows);
        assert!(!customers(&filtered).contains(&"solo"));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_checkout_before_last_row_does_not_count() {
        // Went to the checkout, then back into the store before closing.
        let rows = tagged(&[
            (1, "1", Location::Dairy),
            (2, "1", Location::Checkout),
            (3, "1", Location::Fruit),
        ]);
        assert!(filter_non_exiting_customers(&rows).is_empty());
    }

    #[test]
    fn test_tie_on_last_timestamp_uses_scan_order() {
        let keep = tagged(&[
            (1, "1", Location::Dairy),
            (2, "1", Location::Fruit),
            (2, "1", Location::Checkout),
        ]);
        assert_eq!(filter_non_exiting_customers(&keep).len(), 3);

        let drop = tagged(&[
            (1, "1", Location::Dairy),
            (2, "1", Location::Checkout),
            (2, "1", Location::Fruit),
        ]);
        assert!(filter_non_exiting_customers(&drop).is_empty());
    }

    #[test]
    fn test_preserves_relative_order() {
        let rows = tagged(&[
            (1, "b", Location::Dairy),
            (1, "a", Location::Spices),
            (2, "x", Location::Fruit),
            (3, "a", Location::Checkout),
            (4, "b", Location::Checkout),
        ]);
        let filtered = filter_non_exiting_customers(&rows);
        assert_eq!(customers(&filtered), vec!["b", "a", "a", "b"]);
    }

    #[test]
    fn test_every_retained_trajectory_ends_in_exit() {
        let rows = tagged(&[
            (1, "1", Location::Dairy),
            (2, "2", Location::Dairy),
            (3, "3", Location::Fruit),
            (4, "1", Location::Checkout),
            (5, "3", Location::Checkout),
            (6, "2", Location::Drinks),
        ]);
        let filtered = filter_non_exiting_customers(&rows);

        let mut last: HashMap<&str, bool> = HashMap::new();
        for r in &filtered {
            last.insert(r.customer_no().as_str(), r.is_exit());
        }
        assert_eq!(last.len(), 2);
        assert!(last.values().all(|exit| *exit));
    }

    #[test]
    fn test_refilter_is_idempotent() {
        let rows = tagged(&[
            (1, "1", Location::Dairy),
            (2, "2", Location::Spices),
            (3, "1", Location::Checkout),
        ]);
        let once = filter_non_exiting_customers(&rows);
        let twice = refilter(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_exiting_customers() {
        let rows = tagged(&[
            (1, "1", Location::Dairy),
            (2, "2", Location::Spices),
            (3, "1", Location::Checkout),
        ]);
        let invalid = non_exiting_customers(&rows);
        assert_eq!(invalid.len(), 1);
        assert!(invalid.contains(&CustomerNo::new("2")));
    }

    #[test]
    fn test_unsorted_input_is_resorted() {
        let mut rows = tagged(&[
            (1, "1", Location::Dairy),
            (5, "1", Location::Checkout),
        ]);
        rows.reverse();
        let filtered = filter_non_exiting_customers(&rows);
        assert_eq!(filtered.len(), 2);
        assert!(filtered[0].timestamp() < filtered[1].timestamp());
    }
}

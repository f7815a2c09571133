//! Entry/exit tagging.

use std::collections::HashSet;

use market_core::models::{AnnotatedRecord, CustomerNo, ScanRecord};
use tracing::debug;

/// Sort `scans` by timestamp and tag every row with entry/exit flags.
///
/// The sort is stable, so rows sharing a timestamp keep their scan order and
/// the first of them in that order becomes the customer's entry. Every scan at
/// the checkout is an exit. The returned table is sorted by timestamp.
pub fn add_entry_exit(mut scans: Vec<ScanRecord>) -> Vec<AnnotatedRecord> {
    scans.sort_by_key(|s| s.timestamp);

    let mut seen: HashSet<CustomerNo> = HashSet::new();
    let tagged: Vec<AnnotatedRecord> = scans
        .into_iter()
        .map(|scan| {
            let entry = seen.insert(scan.customer_no.clone());
            AnnotatedRecord::tag(scan, entry)
        })
        .collect();

    debug!(
        "Tagged {} rows: {} customers, {} exits",
        tagged.len(),
        seen.len(),
        tagged.iter().filter(|r| r.exit).count()
    );

    tagged
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Store occupancy over time.
//!
//! Two independent views over tagged rows (filtered or not, the caller
//! decides): a per-location histogram of simultaneous scans, and the running
//! number of customers in the store.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use market_core::models::{Location, TaggedRow};
use serde::Serialize;

// ── LocationCounts ────────────────────────────────────────────────────────────

/// Number of scans per requested location at one timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCountRow {
    pub timestamp: NaiveDateTime,
    /// One count per requested location, in request order.
    pub counts: Vec<u32>,
}

impl LocationCountRow {
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// Scans per location over time, indexed by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCounts {
    /// Column labels.
    pub locations: Vec<Location>,
    /// One row per distinct timestamp in the input, ascending.
    pub rows: Vec<LocationCountRow>,
}

impl LocationCounts {
    /// Count at `timestamp` for `location`, `None` if either is not in the table.
    pub fn get(&self, timestamp: NaiveDateTime, location: Location) -> Option<u32> {
        let column = self.locations.iter().position(|l| *l == location)?;
        let row = self
            .rows
            .binary_search_by_key(&timestamp, |r| r.timestamp)
            .ok()?;
        Some(self.rows[row].counts[column])
    }

    /// The whole column for `location`.
    pub fn column(&self, location: Location) -> Option<Vec<u32>> {
        let column = self.locations.iter().position(|l| *l == location)?;
        Some(self.rows.iter().map(|r| r.counts[column]).collect())
    }
}

/// Count rows per `(timestamp, location)` and pivot to one column per
/// requested location.
///
/// Columns follow the order of `locations`; combinations with no rows are 0,
/// including locations that never occur. Every timestamp present in `rows`
/// gets a row, even if none of its scans is at a requested location.
pub fn customers_by_location<R: TaggedRow>(
    rows: &[R],
    locations: &[Location],
) -> LocationCounts {
    let mut groups: BTreeMap<NaiveDateTime, BTreeMap<Location, u32>> = BTreeMap::new();
    for row in rows {
        *groups
            .entry(row.timestamp())
            .or_default()
            .entry(row.location())
            .or_insert(0) += 1;
    }

    let rows = groups
        .into_iter()
        .map(|(timestamp, by_location)| LocationCountRow {
            timestamp,
            counts: locations
                .iter()
                .map(|l| by_location.get(l).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    LocationCounts {
        locations: locations.to_vec(),
        rows,
    }
}

// ── CustomerTotals ────────────────────────────────────────────────────────────

/// Store population after every event at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomerTotalRow {
    pub timestamp: NaiveDateTime,
    pub customer_total: i64,
}

/// Running number of customers in the store, indexed by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerTotals {
    pub rows: Vec<CustomerTotalRow>,
}

impl CustomerTotals {
    /// Total at exactly `timestamp`.
    pub fn at(&self, timestamp: NaiveDateTime) -> Option<i64> {
        self.rows
            .binary_search_by_key(&timestamp, |r| r.timestamp)
            .ok()
            .map(|i| self.rows[i].customer_total)
    }

    /// Highest total and the first timestamp it was reached.
    pub fn peak(&self) -> Option<CustomerTotalRow> {
        self.rows
            .iter()
            .copied()
            .reduce(|best, r| if r.customer_total > best.customer_total { r } else { best })
    }
}

/// Cumulative sum of `occupancy_delta` per timestamp.
///
/// The total at `T` is the sum over every row with timestamp ≤ `T`, i.e. the
/// population once all events at `T` have been applied.
pub fn customer_total<R: TaggedRow>(rows: &[R]) -> CustomerTotals {
    let mut deltas: BTreeMap<NaiveDateTime, i64> = BTreeMap::new();
    for row in rows {
        *deltas.entry(row.timestamp()).or_insert(0) += i64::from(row.occupancy_delta());
    }

    let mut running = 0i64;
    let rows = deltas
        .into_iter()
        .map(|(timestamp, delta)| {
            running += delta;
            CustomerTotalRow {
                timestamp,
                customer_total: running,
            }
        })
        .collect();

    CustomerTotals { rows }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

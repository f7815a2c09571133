//! Time each customer spends in the store.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use market_core::error::{MarketError, Result};
use market_core::models::{CustomerNo, TaggedRow};
use serde::Serialize;
use tracing::warn;

/// Time in store per customer.
#[derive(Debug, Clone, Default)]
pub struct TimeInStore {
    /// Exit minus entry, keyed (and ordered) by customer number.
    pub durations: BTreeMap<CustomerNo, Duration>,
    /// Customers whose exit precedes their entry. Their (negative) durations
    /// are still present in `durations`.
    pub integrity_warnings: Vec<String>,
}

/// Serialisable form of one [`TimeInStore`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerDuration {
    pub customer_no: CustomerNo,
    pub seconds: i64,
}

impl TimeInStore {
    pub fn get(&self, customer: &CustomerNo) -> Option<Duration> {
        self.durations.get(customer).copied()
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Arithmetic mean, `None` for an empty mapping.
    pub fn mean(&self) -> Option<Duration> {
        let count = i32::try_from(self.durations.len()).ok().filter(|n| *n > 0)?;
        let total = self
            .durations
            .values()
            .fold(Duration::zero(), |acc, d| acc + *d);
        Some(total / count)
    }

    /// Median; the lower middle value for an even count.
    pub fn median(&self) -> Option<Duration> {
        let mut values: Vec<Duration> = self.durations.values().copied().collect();
        if values.is_empty() {
            return None;
        }
        values.sort();
        Some(values[(values.len() - 1) / 2])
    }

    pub fn max(&self) -> Option<(&CustomerNo, Duration)> {
        self.durations
            .iter()
            .max_by_key(|(_, d)| **d)
            .map(|(c, d)| (c, *d))
    }

    /// Rows for JSON output.
    pub fn to_rows(&self) -> Vec<CustomerDuration> {
        self.durations
            .iter()
            .map(|(customer_no, d)| CustomerDuration {
                customer_no: customer_no.clone(),
                seconds: d.num_seconds(),
            })
            .collect()
    }
}

#[derive(Default)]
struct Markers {
    entry: Option<NaiveDateTime>,
    exit: Option<NaiveDateTime>,
}

/// Earliest exit minus earliest entry, per customer.
///
/// Every customer in `rows` needs both an entry and an exit row, which the
/// exit filter guarantees; otherwise this fails with
/// [`MarketError::MissingData`]. Negative spans are kept but logged and listed
/// in [`TimeInStore::integrity_warnings`].
pub fn compute_time_in_store<R: TaggedRow>(rows: &[R]) -> Result<TimeInStore> {
    let mut markers: BTreeMap<&CustomerNo, Markers> = BTreeMap::new();
    for row in rows {
        let m = markers.entry(row.customer_no()).or_default();
        if row.is_entry() {
            m.entry = Some(m.entry.map_or(row.timestamp(), |t| t.min(row.timestamp())));
        }
        if row.is_exit() {
            m.exit = Some(m.exit.map_or(row.timestamp(), |t| t.min(row.timestamp())));
        }
    }

    let mut result = TimeInStore::default();
    for (customer, m) in markers {
        let entry = m.entry.ok_or_else(|| {
            MarketError::MissingData(format!("customer {} has no entry row", customer))
        })?;
        let exit = m.exit.ok_or_else(|| {
            MarketError::MissingData(format!("customer {} has no exit row", customer))
        })?;

        let span = exit - entry;
        if span < Duration::zero() {
            let integrity = MarketError::DataIntegrity(format!(
                "customer {} exits at {} before entering at {}",
                customer, exit, entry
            ));
            warn!("{}", integrity);
            result.integrity_warnings.push(integrity.to_string());
        }
        result.durations.insert(customer.clone(), span);
    }

    Ok(result)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

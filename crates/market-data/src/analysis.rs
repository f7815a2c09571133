//! Main analysis pipeline.
//!
//! Loads the scan files, tags and filters them, then computes the occupancy
//! tables, times in store and the transition matrix in one pass, returning a
//! [`MarketAnalysis`] ready for rendering.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use market_core::error::Result;
use market_core::models::{CustomerNo, Location, TaggedRow};
use market_core::paths::WeekDay;
use serde::Serialize;
use tracing::{debug, info};

use crate::duration::{compute_time_in_store, TimeInStore};
use crate::filter::filter_non_exiting_customers;
use crate::occupancy::{customer_total, customers_by_location, CustomerTotals, LocationCounts};
use crate::reader::{load_all, load_day};
use crate::tagger::add_entry_exit;
use crate::transition::{build_transition_matrix, TransitionMatrix};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    /// `"all"` or the analysed day.
    pub scope: String,
    /// Scan rows read from disk.
    pub rows_loaded: usize,
    /// Rows left after the exit filter.
    pub rows_retained: usize,
    pub customers_seen: usize,
    pub customers_retained: usize,
    /// Customers still in the store at closing time.
    pub customers_dropped: usize,
    /// Whether occupancy tables include the dropped customers.
    pub include_incomplete: bool,
    /// Wall-clock seconds spent reading the files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent on tagging, filtering and aggregation.
    pub transform_time_seconds: f64,
}

/// The complete output of [`analyze_market`].
#[derive(Debug, Clone)]
pub struct MarketAnalysis {
    pub metadata: AnalysisMetadata,
    pub location_counts: LocationCounts,
    pub customer_totals: CustomerTotals,
    pub time_in_store: TimeInStore,
    pub transitions: TransitionMatrix,
    /// Scans per location over the rows used for occupancy, all locations.
    pub scans_per_location: BTreeMap<Location, usize>,
}

/// Headline numbers for the summary view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitSummary {
    pub customers: usize,
    pub mean_seconds_in_store: Option<i64>,
    pub median_seconds_in_store: Option<i64>,
    pub longest_visit_customer: Option<CustomerNo>,
    pub longest_seconds_in_store: Option<i64>,
    pub peak_customer_total: Option<i64>,
    pub peak_at: Option<NaiveDateTime>,
    pub busiest_location: Option<Location>,
    pub busiest_location_scans: usize,
    pub integrity_warnings: usize,
}

impl MarketAnalysis {
    pub fn summary(&self) -> VisitSummary {
        let times = &self.time_in_store;
        let peak = self.customer_totals.peak();
        let longest = times.max();
        let busiest = self
            .scans_per_location
            .iter()
            .fold(None, |best: Option<(Location, usize)>, (l, n)| match best {
                Some((_, bn)) if bn >= *n => best,
                _ => Some((*l, *n)),
            });

        VisitSummary {
            customers: times.len(),
            mean_seconds_in_store: times.mean().map(|d| d.num_seconds()),
            median_seconds_in_store: times.median().map(|d| d.num_seconds()),
            longest_visit_customer: longest.map(|(c, _)| c.clone()),
            longest_seconds_in_store: longest.map(|(_, d)| d.num_seconds()),
            peak_customer_total: peak.map(|p| p.customer_total),
            peak_at: peak.map(|p| p.timestamp),
            busiest_location: busiest.map(|(l, _)| l),
            busiest_location_scans: busiest.map(|(_, n)| n).unwrap_or(0),
            integrity_warnings: times.integrity_warnings.len(),
        }
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Load one day (unprefixed customer numbers) or every day (prefixed).
/// 2. Tag entries and exits.
/// 3. Drop customers that never reach the checkout.
/// 4. Occupancy tables, from the filtered rows unless `include_incomplete`.
/// 5. Times in store and the transition matrix, always from filtered rows.
pub fn analyze_market(
    data_dir: &Path,
    day: Option<WeekDay>,
    locations: &[Location],
    include_incomplete: bool,
) -> Result<MarketAnalysis> {
    // ── Step 1: Load scans ────────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let scans = match day {
        Some(d) => load_day(data_dir, d, false)?,
        None => load_all(data_dir)?,
    };
    let load_time = load_start.elapsed().as_secs_f64();
    let rows_loaded = scans.len();

    // ── Step 2-3: Tag and filter ──────────────────────────────────────────────
    let transform_start = std::time::Instant::now();
    let tagged = add_entry_exit(scans);
    let filtered = filter_non_exiting_customers(&tagged);

    let customers_seen = distinct_customers(&tagged);
    let customers_retained = distinct_customers(&filtered);

    // ── Step 4: Occupancy ─────────────────────────────────────────────────────
    let (location_counts, customer_totals, scans_per_location) = if include_incomplete {
        occupancy_views(&tagged, locations)
    } else {
        occupancy_views(&filtered, locations)
    };

    // ── Step 5: Durations and transitions ─────────────────────────────────────
    let time_in_store = compute_time_in_store(&filtered)?;
    let transitions = build_transition_matrix(&filtered);
    let transform_time = transform_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        scope: day.map_or_else(|| "all".to_string(), |d| d.name().to_string()),
        rows_loaded,
        rows_retained: filtered.len(),
        customers_seen,
        customers_retained,
        customers_dropped: customers_seen - customers_retained,
        include_incomplete,
        load_time_seconds: load_time,
        transform_time_seconds: transform_time,
    };

    info!(
        "Analysed {} rows ({}): {} of {} customers completed their visit",
        rows_loaded, metadata.scope, customers_retained, customers_seen
    );

    Ok(MarketAnalysis {
        metadata,
        location_counts,
        customer_totals,
        time_in_store,
        transitions,
        scans_per_location,
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn distinct_customers<R: TaggedRow>(rows: &[R]) -> usize {
    rows.iter()
        .map(|r| r.customer_no())
        .collect::<HashSet<_>>()
        .len()
}

fn occupancy_views<R: TaggedRow>(
    rows: &[R],
    locations: &[Location],
) -> (LocationCounts, CustomerTotals, BTreeMap<Location, usize>) {
    let mut per_location: BTreeMap<Location, usize> = BTreeMap::new();
    for row in rows {
        *per_location.entry(row.location()).or_insert(0) += 1;
    }
    debug!("Occupancy over {} rows", rows.len());

    (
        customers_by_location(rows, locations),
        customer_total(rows),
        per_location,
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Location transition probabilities.
//!
//! Each customer's filtered trajectory is prefixed with a synthetic
//! `entrance` step, consecutive locations are paired, and the pair counts are
//! normalised per source location into a row-stochastic matrix.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDateTime;
use market_core::error::Result;
use market_core::models::{CustomerNo, FilteredRecord, Location, TaggedRow};
use serde::Serialize;
use tracing::debug;

use crate::filter::filter_non_exiting_customers;
use crate::reader::load_all;
use crate::tagger::add_entry_exit;

// ── VisitStep ─────────────────────────────────────────────────────────────────

/// One step of a customer trajectory, synthetic entrance steps included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitStep {
    pub customer_no: CustomerNo,
    pub timestamp: NaiveDateTime,
    pub location: Location,
    /// The trajectory ends here; no transition leaves an exit step.
    pub exit: bool,
}

impl From<&FilteredRecord> for VisitStep {
    fn from(row: &FilteredRecord) -> Self {
        Self {
            customer_no: row.customer_no().clone(),
            timestamp: row.timestamp(),
            location: row.location(),
            exit: row.is_exit(),
        }
    }
}

/// Convert rows to steps, inserting an `entrance` step right before each
/// customer's entry row, with the entry row's timestamp.
pub fn add_entrance_location(rows: &[FilteredRecord]) -> Vec<VisitStep> {
    let mut steps = Vec::with_capacity(rows.len() * 2);
    for row in rows {
        if row.is_entry() {
            steps.push(VisitStep {
                customer_no: row.customer_no().clone(),
                timestamp: row.timestamp(),
                location: Location::Entrance,
                exit: false,
            });
        }
        steps.push(VisitStep::from(row));
    }
    steps
}

// ── TransitionMatrix ──────────────────────────────────────────────────────────

/// Row-stochastic matrix of `P(next = to | current = from)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionMatrix {
    /// Row labels: every location visited, in `Location` order.
    pub sources: Vec<Location>,
    /// Column labels: every location observed as a next location.
    pub destinations: Vec<Location>,
    /// Raw pair counts, `counts[row][column]`.
    pub counts: Vec<Vec<u64>>,
    /// Counts divided by their row sum; all zeros for rows without any
    /// outgoing transition.
    pub probabilities: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    fn from_counts(
        sources: BTreeSet<Location>,
        pairs: BTreeMap<(Location, Location), u64>,
    ) -> Self {
        let destinations: Vec<Location> = pairs
            .keys()
            .map(|(_, to)| *to)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let sources: Vec<Location> = sources.into_iter().collect();

        let counts: Vec<Vec<u64>> = sources
            .iter()
            .map(|from| {
                destinations
                    .iter()
                    .map(|to| pairs.get(&(*from, *to)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        let probabilities = counts
            .iter()
            .map(|row| {
                let total: u64 = row.iter().sum();
                if total == 0 {
                    vec![0.0; row.len()]
                } else {
                    row.iter().map(|c| *c as f64 / total as f64).collect()
                }
            })
            .collect();

        Self {
            sources,
            destinations,
            counts,
            probabilities,
        }
    }

    fn index(&self, from: Location, to: Location) -> Option<(usize, usize)> {
        let row = self.sources.iter().position(|l| *l == from)?;
        let column = self.destinations.iter().position(|l| *l == to)?;
        Some((row, column))
    }

    /// `P(to | from)`; 0.0 when either label is absent from the matrix.
    pub fn probability(&self, from: Location, to: Location) -> f64 {
        self.index(from, to)
            .map(|(r, c)| self.probabilities[r][c])
            .unwrap_or(0.0)
    }

    /// Observed `from → to` transitions.
    pub fn count(&self, from: Location, to: Location) -> u64 {
        self.index(from, to)
            .map(|(r, c)| self.counts[r][c])
            .unwrap_or(0)
    }

    /// Probabilities out of `from`, aligned with `destinations`.
    pub fn row(&self, from: Location) -> Option<&[f64]> {
        let r = self.sources.iter().position(|l| *l == from)?;
        Some(&self.probabilities[r])
    }

    /// 1.0 (up to rounding) for rows with transitions, 0.0 otherwise.
    pub fn row_sum(&self, from: Location) -> Option<f64> {
        self.row(from).map(|p| p.iter().sum())
    }

    /// The most likely next location from `from`, if any transition left it.
    pub fn most_likely_next(&self, from: Location) -> Option<Location> {
        let row = self.row(from)?;
        row.iter()
            .enumerate()
            .filter(|(_, p)| **p > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
                Some((_, bp)) if bp >= *p => best,
                _ => Some((i, *p)),
            })
            .map(|(i, _)| self.destinations[i])
    }

    pub fn total_transitions(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Build the transition matrix from exit-filtered rows.
///
/// Steps are sorted by `(customer_no, timestamp)` with a stable sort. The next
/// location of a step is the location of the following step of the same
/// customer, unless the step is an exit. Pairs without a next location are
/// ignored.
pub fn build_transition_matrix(rows: &[FilteredRecord]) -> TransitionMatrix {
    let mut steps = add_entrance_location(rows);
    steps.sort_by(|a, b| {
        a.customer_no
            .cmp(&b.customer_no)
            .then(a.timestamp.cmp(&b.timestamp))
    });

    let sources: BTreeSet<Location> = steps.iter().map(|s| s.location).collect();
    let mut pairs: BTreeMap<(Location, Location), u64> = BTreeMap::new();

    for window in steps.windows(2) {
        let (current, next) = (&window[0], &window[1]);
        if current.exit || current.customer_no != next.customer_no {
            continue;
        }
        *pairs.entry((current.location, next.location)).or_insert(0) += 1;
    }

    let matrix = TransitionMatrix::from_counts(sources, pairs);
    debug!(
        "Transition matrix: {} steps, {} transitions, {}x{}",
        steps.len(),
        matrix.total_transitions(),
        matrix.sources.len(),
        matrix.destinations.len()
    );
    matrix
}

/// Load every day from `data_dir`, tag, filter and build the matrix.
pub fn get_transition_matrix(data_dir: &Path) -> Result<TransitionMatrix> {
    let scans = load_all(data_dir)?;
    let tagged = add_entry_exit(scans);
    let filtered = filter_non_exiting_customers(&tagged);
    Ok(build_transition_matrix(&filtered))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use market_core::models::ScanRecord;
    use market_core::paths::{day_data_file_path, WeekDay};
    use std::io::Write;
    use strum::IntoEnumIterator;
    use tempfile::TempDir;

    const TOLERANCE: f64 = 1e-9;

    fn ts(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 9, 2)
            .unwrap()
            .and_hms_opt(9, m, 0)
            .unwrap()
    }

    fn filtered(rows: &[(u32, &str, Location)]) -> Vec<FilteredRecord> {
        let tagged = add_entry_exit(
            rows.iter()
                .map(|(m, c, l)| ScanRecord::new(ts(*m), *c, *l))
                .collect(),
        );
        filter_non_exiting_customers(&tagged)
    }

    fn worked_example() -> Vec<FilteredRecord> {
        filtered(&[
            (1, "A", Location::Dairy),
            (2, "A", Location::Checkout),
            (3, "B", Location::Dairy),
            (4, "B", Location::Spices),
            (5, "B", Location::Checkout),
        ])
    }

    // ── add_entrance_location ─────────────────────────────────────────────────

    #[test]
    fn test_entrance_precedes_entry_row() {
        let steps = add_entrance_location(&worked_example());
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[0].location, Location::Entrance);
        assert_eq!(steps[0].timestamp, ts(1));
        assert_eq!(steps[1].location, Location::Dairy);
        assert!(!steps[0].exit);
    }

    #[test]
    fn test_one_entrance_per_customer() {
        let steps = add_entrance_location(&worked_example());
        let entrances = steps
            .iter()
            .filter(|s| s.location == Location::Entrance)
            .count();
        assert_eq!(entrances, 2);
    }

    // ── build_transition_matrix ───────────────────────────────────────────────

    #[test]
    fn test_worked_example_probabilities() {
        let m = build_transition_matrix(&worked_example());

        assert_eq!(m.count(Location::Entrance, Location::Dairy), 2);
        assert!((m.probability(Location::Entrance, Location::Dairy) - 1.0).abs() < TOLERANCE);

        assert_eq!(m.count(Location::Dairy, Location::Checkout), 1);
        assert_eq!(m.count(Location::Dairy, Location::Spices), 1);
        assert!((m.probability(Location::Dairy, Location::Checkout) - 0.5).abs() < TOLERANCE);
        assert!((m.probability(Location::Dairy, Location::Spices) - 0.5).abs() < TOLERANCE);

        assert!((m.probability(Location::Spices, Location::Checkout) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_labels() {
        let m = build_transition_matrix(&worked_example());
        assert_eq!(
            m.sources,
            vec![
                Location::Checkout,
                Location::Dairy,
                Location::Entrance,
                Location::Spices
            ]
        );
        assert_eq!(
            m.destinations,
            vec![Location::Checkout, Location::Dairy, Location::Spices]
        );
    }

    #[test]
    fn test_no_transition_out_of_checkout() {
        let m = build_transition_matrix(&worked_example());
        assert_eq!(m.row_sum(Location::Checkout), Some(0.0));
        assert!(m.row(Location::Checkout).unwrap().iter().all(|p| *p == 0.0));
    }

    #[test]
    fn test_entrance_is_never_a_destination() {
        let m = build_transition_matrix(&worked_example());
        assert!(!m.destinations.contains(&Location::Entrance));
    }

    #[test]
    fn test_rows_sum_to_one_or_zero() {
        let m = build_transition_matrix(&filtered(&[
            (1, "1", Location::Fruit),
            (2, "1", Location::Dairy),
            (3, "1", Location::Fruit),
            (4, "1", Location::Checkout),
            (1, "2", Location::Drinks),
            (3, "2", Location::Spices),
            (5, "2", Location::Fruit),
            (6, "2", Location::Checkout),
            (2, "3", Location::Spices),
            (7, "3", Location::Checkout),
        ]));

        for from in &m.sources {
            let sum = m.row_sum(*from).unwrap();
            assert!(
                (sum - 1.0).abs() < TOLERANCE || sum == 0.0,
                "row {from} sums to {sum}"
            );
        }
        assert!((m.probability(Location::Fruit, Location::Dairy) - 1.0 / 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_interleaved_customers_are_separated() {
        // Rows of two customers alternate in time; transitions must not cross.
        let m = build_transition_matrix(&filtered(&[
            (1, "1", Location::Dairy),
            (1, "2", Location::Fruit),
            (2, "1", Location::Checkout),
            (2, "2", Location::Checkout),
        ]));
        assert_eq!(m.count(Location::Dairy, Location::Fruit), 0);
        assert_eq!(m.count(Location::Fruit, Location::Checkout), 1);
        assert_eq!(m.count(Location::Dairy, Location::Checkout), 1);
    }

    #[test]
    fn test_tied_entry_timestamp_keeps_scan_order() {
        let m = build_transition_matrix(&filtered(&[
            (1, "A", Location::Fruit),
            (1, "A", Location::Dairy),
            (2, "A", Location::Checkout),
        ]));
        assert_eq!(m.count(Location::Entrance, Location::Fruit), 1);
        assert_eq!(m.count(Location::Entrance, Location::Dairy), 0);
        assert_eq!(m.count(Location::Fruit, Location::Dairy), 1);
        assert_eq!(m.count(Location::Dairy, Location::Checkout), 1);
        assert_eq!(m.total_transitions(), 3);
    }

    #[test]
    fn test_repeated_location_counts_self_transition() {
        let m = build_transition_matrix(&filtered(&[
            (1, "1", Location::Drinks),
            (2, "1", Location::Drinks),
            (3, "1", Location::Checkout),
        ]));
        assert!((m.probability(Location::Drinks, Location::Drinks) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_most_likely_next() {
        let m = build_transition_matrix(&filtered(&[
            (1, "1", Location::Dairy),
            (2, "1", Location::Checkout),
            (1, "2", Location::Dairy),
            (2, "2", Location::Checkout),
            (1, "3", Location::Dairy),
            (2, "3", Location::Fruit),
            (3, "3", Location::Checkout),
        ]));
        assert_eq!(m.most_likely_next(Location::Dairy), Some(Location::Checkout));
        assert_eq!(m.most_likely_next(Location::Checkout), None);
    }

    #[test]
    fn test_empty_input() {
        let m = build_transition_matrix(&[]);
        assert!(m.sources.is_empty());
        assert_eq!(m.total_transitions(), 0);
        assert_eq!(m.probability(Location::Dairy, Location::Fruit), 0.0);
    }

    // ── get_transition_matrix ─────────────────────────────────────────────────

    #[test]
    fn test_get_transition_matrix_from_files() {
        let dir = TempDir::new().unwrap();
        for day in WeekDay::iter() {
            let mut file = std::fs::File::create(day_data_file_path(dir.path(), day)).unwrap();
            writeln!(file, "timestamp;customer_no;location").unwrap();
            writeln!(file, "2019-09-02 07:03:00;1;dairy").unwrap();
            writeln!(file, "2019-09-02 07:04:00;2;fruit").unwrap();
            writeln!(file, "2019-09-02 07:05:00;1;checkout").unwrap();
        }

        let m = get_transition_matrix(dir.path()).unwrap();

        // Customer 2 never checks out on any day; customer 1 does every day.
        assert_eq!(m.count(Location::Entrance, Location::Dairy), 5);
        assert_eq!(m.count(Location::Dairy, Location::Checkout), 5);
        assert!(!m.sources.contains(&Location::Fruit));
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::error::{MarketError, Result};

// ── Location ──────────────────────────────────────────────────────────────────

/// A place in the store where a customer can be scanned.
///
/// Variants are declared alphabetically; the derived `Ord` is the row and
/// column order of every table produced downstream.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Location {
    Checkout,
    Dairy,
    Drinks,
    /// Synthetic location preceding a customer's first real scan.
    Entrance,
    Fruit,
    Spices,
}

impl Location {
    /// Parse a raw location field, ignoring surrounding whitespace and case.
    pub fn parse(raw: &str) -> Result<Self> {
        Location::from_str(raw.trim().to_lowercase().as_str())
            .map_err(|_| MarketError::UnknownLocation(raw.to_string()))
    }

    /// The locations that can appear in a scan file, in table order.
    pub fn store_locations() -> Vec<Location> {
        Location::iter().filter(|l| !l.is_synthetic()).collect()
    }

    /// `true` for locations that only exist inside the transition model.
    pub fn is_synthetic(self) -> bool {
        self == Location::Entrance
    }

    /// Whether a scan here means the customer is leaving.
    pub fn is_checkout(self) -> bool {
        self == Location::Checkout
    }
}

// ── CustomerNo ────────────────────────────────────────────────────────────────

/// Customer identifier as found in the scan files.
///
/// Numbers are only unique within one day; [`CustomerNo::prefixed`] builds the
/// `"<day>_<no>"` form used when several days are combined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerNo(String);

impl CustomerNo {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Namespace this identifier with a day label, e.g. `monday_1`.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self(format!("{}_{}", prefix, self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CustomerNo {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CustomerNo {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ── ScanRecord ────────────────────────────────────────────────────────────────

/// One timestamped observation of a customer at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Local wall-clock time of the scan (the files carry no offset).
    pub timestamp: NaiveDateTime,
    pub customer_no: CustomerNo,
    pub location: Location,
}

impl ScanRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        customer_no: impl Into<CustomerNo>,
        location: Location,
    ) -> Self {
        Self {
            timestamp,
            customer_no: customer_no.into(),
            location,
        }
    }
}

// ── AnnotatedRecord ───────────────────────────────────────────────────────────

/// A scan record with its entry/exit flags and occupancy contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub scan: ScanRecord,
    /// First appearance of the customer in the (sorted) data.
    pub entry: bool,
    /// Scan at the checkout.
    pub exit: bool,
    /// `+1` on entry, `-1` on exit, `0` otherwise.
    pub occupancy_delta: i8,
}

impl AnnotatedRecord {
    /// Tag `scan`, deriving `exit` and `occupancy_delta` from its location.
    ///
    /// A row that is both the entry and a checkout scan contributes nothing
    /// to the running total: the customer arrives and leaves in one event.
    /// The exit does not override the entry here; that would push the total
    /// below zero for a customer who was never counted in.
    pub fn tag(scan: ScanRecord, entry: bool) -> Self {
        let exit = scan.location.is_checkout();
        let occupancy_delta = match (entry, exit) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        };
        Self {
            scan,
            entry,
            exit,
            occupancy_delta,
        }
    }
}

// ── FilteredRecord ────────────────────────────────────────────────────────────

/// An annotated record whose customer is known to finish at the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilteredRecord(AnnotatedRecord);

impl FilteredRecord {
    /// Wrap a record whose trajectory has already been checked to end in an
    /// exit. Only the exit filter should call this.
    pub fn from_verified(record: AnnotatedRecord) -> Self {
        Self(record)
    }

    pub fn into_annotated(self) -> AnnotatedRecord {
        self.0
    }
}

// ── TaggedRow ─────────────────────────────────────────────────────────────────

/// Read access to the tagged columns, shared by filtered and unfiltered rows.
pub trait TaggedRow {
    fn annotated(&self) -> &AnnotatedRecord;

    fn timestamp(&self) -> NaiveDateTime {
        self.annotated().scan.timestamp
    }

    fn customer_no(&self) -> &CustomerNo {
        &self.annotated().scan.customer_no
    }

    fn location(&self) -> Location {
        self.annotated().scan.location
    }

    fn is_entry(&self) -> bool {
        self.annotated().entry
    }

    fn is_exit(&self) -> bool {
        self.annotated().exit
    }

    fn occupancy_delta(&self) -> i8 {
        self.annotated().occupancy_delta
    }
}

impl TaggedRow for AnnotatedRecord {
    fn annotated(&self) -> &AnnotatedRecord {
        self
    }
}

impl TaggedRow for FilteredRecord {
    fn annotated(&self) -> &AnnotatedRecord {
        &self.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

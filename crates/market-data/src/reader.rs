//! Scan file loading.
//!
//! Reads the semicolon-delimited per-day files (`timestamp;customer_no;location`)
//! into [`ScanRecord`]s. Every row must parse; a bad timestamp, an empty
//! customer number or an unknown location aborts the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use market_core::error::{MarketError, Result};
use market_core::models::{CustomerNo, Location, ScanRecord};
use market_core::paths::{day_data_file_path, WeekDay};
use market_core::time_utils::parse_timestamp;
use serde::Deserialize;
use strum::IntoEnumIterator;
use tracing::debug;

/// Field separator used by the scan files.
pub const DELIMITER: u8 = b';';

/// A row exactly as it appears in the file, before validation.
#[derive(Debug, Deserialize)]
struct RawScanRow {
    timestamp: String,
    customer_no: String,
    location: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the scan records of one day.
///
/// With `prefix_customer_no`, every customer number becomes
/// `"<day>_<customer_no>"` so that several days can be concatenated safely.
pub fn load_day(
    data_dir: &Path,
    day: WeekDay,
    prefix_customer_no: bool,
) -> Result<Vec<ScanRecord>> {
    let path = day_data_file_path(data_dir, day);
    let prefix = prefix_customer_no.then(|| day.name());
    read_scan_file(&path, prefix)
}

/// Load every weekday, customer numbers prefixed, concatenated in weekday
/// order.
pub fn load_all(data_dir: &Path) -> Result<Vec<ScanRecord>> {
    if !data_dir.is_dir() {
        return Err(MarketError::DataPathNotFound(data_dir.to_path_buf()));
    }

    let mut all_records = Vec::new();
    for day in WeekDay::iter() {
        let records = load_day(data_dir, day, true)?;
        debug!("Loaded {} scans for {}", records.len(), day);
        all_records.extend(records);
    }

    debug!("Loaded {} scans in total", all_records.len());
    Ok(all_records)
}

/// Read one scan file from disk.
pub fn read_scan_file(path: &Path, prefix: Option<&str>) -> Result<Vec<ScanRecord>> {
    let file = File::open(path).map_err(|source| MarketError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_scans(file, path, prefix)?;
    debug!("File {}: {} scans", path.display(), records.len());
    Ok(records)
}

/// Parse scan rows from any reader. `source` only labels error messages.
pub fn parse_scans<R: Read>(
    reader: R,
    source: &Path,
    prefix: Option<&str>,
) -> Result<Vec<ScanRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let raw: RawScanRow = row.deserialize(Some(&headers))?;
        records.push(to_scan_record(raw, source, line, prefix)?);
    }
    Ok(records)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn to_scan_record(
    raw: RawScanRow,
    source: &Path,
    line: u64,
    prefix: Option<&str>,
) -> Result<ScanRecord> {
    let malformed = |reason: String| MarketError::MalformedRow {
        path: source.to_path_buf(),
        line,
        reason,
    };

    let timestamp = parse_timestamp(&raw.timestamp).map_err(|e| malformed(e.to_string()))?;

    if raw.customer_no.is_empty() {
        return Err(malformed("empty customer_no".to_string()));
    }
    let customer_no = CustomerNo::new(raw.customer_no);
    let customer_no = match prefix {
        Some(p) => customer_no.prefixed(p),
        None => customer_no,
    };

    let location = Location::parse(&raw.location).map_err(|e| malformed(e.to_string()))?;
    if location.is_synthetic() {
        return Err(malformed(format!("reserved location: {}", raw.location)));
    }

    Ok(ScanRecord {
        timestamp,
        customer_no,
        location,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Weekday enumeration and data file path resolution.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Week days for which scan data is recorded.
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
    strum_macros::AsRefStr,
    strum_macros::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl WeekDay {
    /// Lowercase day name, used as file stem and customer prefix.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// `"<day>.csv"`.
    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Parse a day name, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self> {
        WeekDay::from_str(raw.trim().to_lowercase().as_str())
            .map_err(|_| MarketError::Config(format!("unknown week day: {}", raw)))
    }
}

/// Absolute-or-relative path of the scan file for `day` under `data_dir`.
pub fn day_data_file_path(data_dir: &Path, day: WeekDay) -> PathBuf {
    data_dir.join(day.file_name())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

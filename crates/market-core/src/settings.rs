use clap::Parser;
use std::path::PathBuf;

use crate::error::{MarketError, Result};
use crate::models::Location;
use crate::paths::WeekDay;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Occupancy and movement analysis for supermarket scan logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "market-behavior",
    about = "Occupancy and movement analysis for supermarket scan logs",
    version
)]
pub struct Settings {
    /// Directory holding one `<weekday>.csv` file per day
    #[arg(long, env = "MARKET_DATA_DIR", default_value = crate::paths::DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Day to analyse, or all days combined
    #[arg(long, default_value = "all", value_parser = ["all", "monday", "tuesday", "wednesday", "thursday", "friday"])]
    pub day: String,

    /// Report to print
    #[arg(long, default_value = "summary", value_parser = ["summary", "occupancy", "totals", "durations", "transitions"])]
    pub view: String,

    /// Comma-separated locations for the occupancy view
    #[arg(long, default_value = "checkout,dairy,drinks,fruit,spices")]
    pub locations: String,

    /// Keep customers that never reach the checkout in the occupancy views
    #[arg(long)]
    pub include_incomplete: bool,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but with an explicit argument list, so tests
    /// don't depend on the process arguments.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The selected day, `None` meaning every day combined.
    pub fn selected_day(&self) -> Result<Option<WeekDay>> {
        if self.day.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        WeekDay::parse(&self.day).map(Some)
    }

    /// The requested occupancy columns, in the order given.
    pub fn selected_locations(&self) -> Result<Vec<Location>> {
        let locations = self
            .locations
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Location::parse(s)
                    .map_err(|_| MarketError::Config(format!("unknown location: {}", s)))
            })
            .collect::<Result<Vec<_>>>()?;

        if locations.is_empty() {
            return Err(MarketError::Config("no locations requested".to_string()));
        }
        Ok(locations)
    }

    /// Check every derived value once, before any file is read.
    pub fn validate(&self) -> Result<()> {
        self.selected_day()?;
        self.selected_locations()?;
        Ok(())
    }

    pub fn json_output(&self) -> bool {
        self.format == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

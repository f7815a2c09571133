//! Shared types for the supermarket behaviour analysis.
//!
//! Typed scan records for each pipeline stage, store locations, weekdays and
//! their data files, the error type, CLI settings and text formatting.

pub mod error;
pub mod formatting;
pub mod models;
pub mod paths;
pub mod settings;
pub mod time_utils;

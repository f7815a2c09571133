//! Data layer for the supermarket behaviour analysis.
//!
//! Reads the per-day scan files, tags customer entries and exits, filters out
//! visits that never reach the checkout, and derives occupancy over time,
//! time in store and the location transition matrix.

pub mod analysis;
pub mod duration;
pub mod filter;
pub mod occupancy;
pub mod reader;
pub mod tagger;
pub mod transition;

pub use market_core as core;

mod bootstrap;
mod report;

use anyhow::{Context, Result};
use market_core::settings::Settings;
use market_data::analysis::analyze_market;

use crate::report::{render_json, render_text, View};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("market-behavior v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, Day: {}, View: {}",
        settings.data_dir.display(),
        settings.day,
        settings.view
    );

    settings.validate()?;
    let day = settings.selected_day()?;
    let locations = settings.selected_locations()?;
    let view = View::parse(&settings.view)?;
    let data_dir = bootstrap::check_data_dir(&settings.data_dir)?;

    let analysis = analyze_market(&data_dir, day, &locations, settings.include_incomplete)
        .with_context(|| format!("analysis of {} failed", data_dir.display()))?;

    tracing::debug!(
        "Loaded in {:.3}s, transformed in {:.3}s",
        analysis.metadata.load_time_seconds,
        analysis.metadata.transform_time_seconds
    );

    let output = if settings.json_output() {
        render_json(view, &analysis)?
    } else {
        render_text(view, &analysis)
    };
    print!("{}", output);
    if settings.json_output() {
        println!();
    }

    Ok(())
}

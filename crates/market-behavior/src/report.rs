//! Text and JSON rendering of a [`MarketAnalysis`].

use market_core::error::Result;
use market_core::formatting::{
    format_count, format_duration, format_probability, format_timestamp, render_table,
};
use market_data::analysis::MarketAnalysis;
use serde_json::json;

/// The report selected with `--view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    Occupancy,
    Totals,
    Durations,
    Transitions,
}

impl View {
    /// Parse a `--view` value; clap has already restricted the choices.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "summary" => Ok(View::Summary),
            "occupancy" => Ok(View::Occupancy),
            "totals" => Ok(View::Totals),
            "durations" => Ok(View::Durations),
            "transitions" => Ok(View::Transitions),
            other => anyhow::bail!("unknown view: {}", other),
        }
    }
}

/// Render `view` as a plain-text table.
pub fn render_text(view: View, analysis: &MarketAnalysis) -> String {
    match view {
        View::Summary => summary_text(analysis),
        View::Occupancy => occupancy_text(analysis),
        View::Totals => totals_text(analysis),
        View::Durations => durations_text(analysis),
        View::Transitions => transitions_text(analysis),
    }
}

/// Render `view` as pretty-printed JSON.
pub fn render_json(view: View, analysis: &MarketAnalysis) -> Result<String> {
    let value = match view {
        View::Summary => json!({
            "metadata": analysis.metadata,
            "summary": analysis.summary(),
        }),
        View::Occupancy => serde_json::to_value(&analysis.location_counts)?,
        View::Totals => serde_json::to_value(&analysis.customer_totals)?,
        View::Durations => json!({
            "durations": analysis.time_in_store.to_rows(),
            "integrity_warnings": analysis.time_in_store.integrity_warnings,
        }),
        View::Transitions => serde_json::to_value(&analysis.transitions)?,
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

// ── Views ─────────────────────────────────────────────────────────────────────

fn summary_text(analysis: &MarketAnalysis) -> String {
    let meta = &analysis.metadata;
    let summary = analysis.summary();
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let seconds =
        |s: Option<i64>| or_dash(s.map(|s| format_duration(chrono::Duration::seconds(s))));

    let dropped_share = if meta.customers_seen == 0 {
        0.0
    } else {
        meta.customers_dropped as f64 * 100.0 / meta.customers_seen as f64
    };

    let rows = vec![
        vec!["scope".to_string(), meta.scope.clone()],
        vec!["rows loaded".to_string(), format_count(meta.rows_loaded)],
        vec!["rows retained".to_string(), format_count(meta.rows_retained)],
        vec!["customers".to_string(), format_count(meta.customers_seen)],
        vec![
            "completed visits".to_string(),
            format_count(meta.customers_retained),
        ],
        vec![
            "still inside at close".to_string(),
            format!("{} ({:.1}%)", format_count(meta.customers_dropped), dropped_share),
        ],
        vec!["mean time in store".to_string(), seconds(summary.mean_seconds_in_store)],
        vec!["median time in store".to_string(), seconds(summary.median_seconds_in_store)],
        vec![
            "longest visit".to_string(),
            or_dash(summary.longest_visit_customer.as_ref().map(|c| {
                format!("{} ({})", c, seconds(summary.longest_seconds_in_store))
            })),
        ],
        vec![
            "peak occupancy".to_string(),
            or_dash(summary.peak_customer_total.zip(summary.peak_at).map(|(n, at)| {
                format!("{} at {}", n, format_timestamp(at))
            })),
        ],
        vec![
            "busiest location".to_string(),
            or_dash(summary.busiest_location.map(|l| {
                format!("{} ({} scans)", l, summary.busiest_location_scans)
            })),
        ],
        vec![
            "integrity warnings".to_string(),
            summary.integrity_warnings.to_string(),
        ],
    ];

    render_table(&["metric", "value"], &rows)
}

fn occupancy_text(analysis: &MarketAnalysis) -> String {
    let table = &analysis.location_counts;
    let labels: Vec<String> = table.locations.iter().map(|l| l.to_string()).collect();
    let mut headers: Vec<&str> = vec!["timestamp"];
    headers.extend(labels.iter().map(String::as_str));

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            let mut cells = vec![format_timestamp(r.timestamp)];
            cells.extend(r.counts.iter().map(|c| c.to_string()));
            cells
        })
        .collect();

    render_table(&headers, &rows)
}

fn totals_text(analysis: &MarketAnalysis) -> String {
    let rows: Vec<Vec<String>> = analysis
        .customer_totals
        .rows
        .iter()
        .map(|r| vec![format_timestamp(r.timestamp), r.customer_total.to_string()])
        .collect();
    render_table(&["timestamp", "customer_total"], &rows)
}

fn durations_text(analysis: &MarketAnalysis) -> String {
    let times = &analysis.time_in_store;
    let rows: Vec<Vec<String>> = times
        .durations
        .iter()
        .map(|(customer, d)| vec![customer.to_string(), format_duration(*d)])
        .collect();

    let mut out = render_table(&["customer_no", "time_in_store"], &rows);
    for warning in &times.integrity_warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }
    out
}

fn transitions_text(analysis: &MarketAnalysis) -> String {
    let matrix = &analysis.transitions;
    let labels: Vec<String> = matrix.destinations.iter().map(|l| l.to_string()).collect();
    let mut headers: Vec<&str> = vec!["location"];
    headers.extend(labels.iter().map(String::as_str));

    let rows: Vec<Vec<String>> = matrix
        .sources
        .iter()
        .zip(&matrix.probabilities)
        .map(|(from, probs)| {
            let mut cells = vec![from.to_string()];
            cells.extend(probs.iter().map(|p| format_probability(*p)));
            cells
        })
        .collect();

    render_table(&headers, &rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::models::Location;
    use market_core::paths::{day_data_file_path, WeekDay};
    use market_data::analysis::analyze_market;
    use std::io::Write;
    use tempfile::TempDir;

    fn sample_analysis() -> MarketAnalysis {
        let dir = TempDir::new().expect("tempdir");
        let mut file =
            std::fs::File::create(day_data_file_path(dir.path(), WeekDay::Monday)).expect("create");
        for line in [
            "timestamp;customer_no;location",
            "2019-09-02 07:03:00;1;dairy",
            "2019-09-02 07:04:00;2;dairy",
            "2019-09-02 07:05:00;2;spices",
            "2019-09-02 07:05:00;1;checkout",
            "2019-09-02 07:06:00;2;checkout",
        ] {
            writeln!(file, "{}", line).expect("write");
        }

        analyze_market(
            dir.path(),
            Some(WeekDay::Monday),
            &[Location::Dairy, Location::Spices],
            false,
        )
        .expect("analysis")
    }

    #[test]
    fn test_view_parse() {
        assert_eq!(View::parse("transitions").unwrap(), View::Transitions);
        assert!(View::parse("heatmap").is_err());
    }

    #[test]
    fn test_occupancy_text_columns_in_request_order() {
        let text = render_text(View::Occupancy, &sample_analysis());
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("timestamp"));
        assert!(header.find("dairy").unwrap() < header.find("spices").unwrap());
        assert_eq!(text.lines().count(), 2 + 4);
    }

    #[test]
    fn test_transitions_text() {
        let text = render_text(View::Transitions, &sample_analysis());
        let entrance = text
            .lines()
            .find(|l| l.starts_with("entrance"))
            .expect("entrance row");
        assert!(entrance.contains("1.000"));
        let checkout = text
            .lines()
            .find(|l| l.starts_with("checkout"))
            .expect("checkout row");
        assert!(!checkout.contains('1'));
    }

    #[test]
    fn test_durations_text() {
        let text = render_text(View::Durations, &sample_analysis());
        assert!(text.contains("2m"));
        assert!(text.contains("customer_no"));
    }

    #[test]
    fn test_summary_text_mentions_peak() {
        let text = render_text(View::Summary, &sample_analysis());
        assert!(text.contains("peak occupancy"));
        assert!(text.contains("2 at 2019-09-02 07:04:00"));
    }

    #[test]
    fn test_summary_text_dropped_share() {
        let dir = TempDir::new().expect("tempdir");
        let mut file =
            std::fs::File::create(day_data_file_path(dir.path(), WeekDay::Monday)).expect("create");
        for line in [
            "timestamp;customer_no;location",
            "2019-09-02 07:03:00;1;dairy",
            "2019-09-02 07:04:00;2;fruit",
            "2019-09-02 07:04:00;3;drinks",
            "2019-09-02 07:05:00;1;checkout",
        ] {
            writeln!(file, "{}", line).expect("write");
        }
        let analysis =
            analyze_market(dir.path(), Some(WeekDay::Monday), &[Location::Dairy], false)
                .expect("analysis");

        let text = render_text(View::Summary, &analysis);
        let line = text
            .lines()
            .find(|l| l.starts_with("still inside at close"))
            .expect("dropped row");
        assert!(line.ends_with("2 (66.7%)"), "{line}");
    }

    #[test]
    fn test_json_totals() {
        let out = render_json(View::Totals, &sample_analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let totals: Vec<i64> = value["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["customer_total"].as_i64().unwrap())
            .collect();
        assert_eq!(totals, vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_json_transitions() {
        let out = render_json(View::Transitions, &sample_analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["sources"][0], "checkout");
        assert!(value["probabilities"].is_array());
    }

    #[test]
    fn test_json_summary_has_metadata() {
        let out = render_json(View::Summary, &sample_analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["metadata"]["scope"], "monday");
        assert_eq!(value["summary"]["customers"], 2);
    }
}

use chrono::{Duration, NaiveDateTime};

/// A count with thousands separators.
///
/// ```
/// use market_core::formatting::format_count;
///
/// assert_eq!(format_count(987), "987");
/// assert_eq!(format_count(24_877), "24,877");
/// ```
pub fn format_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Format a time span as minutes, with hours once it reaches an hour.
///
/// * `< 1h`, whole minutes → `"4m"`
/// * `< 1h`, with seconds → `"4m 30s"`
/// * `≥ 1h` → `"1h 05m"` (seconds dropped)
/// * negative spans keep a leading `-`
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use market_core::formatting::format_duration;
///
/// assert_eq!(format_duration(Duration::minutes(4)), "4m");
/// assert_eq!(format_duration(Duration::seconds(270)), "4m 30s");
/// assert_eq!(format_duration(Duration::minutes(65)), "1h 05m");
/// assert_eq!(format_duration(Duration::minutes(-3)), "-3m");
/// ```
pub fn format_duration(span: Duration) -> String {
    let total = span.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let secs = total.unsigned_abs();

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}{}h {:02}m", sign, hours, minutes)
    } else if seconds == 0 {
        format!("{}{}m", sign, minutes)
    } else {
        format!("{}{}m {:02}s", sign, minutes, seconds)
    }
}

/// Three-decimal rendering of a transition probability.
///
/// ```
/// use market_core::formatting::format_probability;
///
/// assert_eq!(format_probability(0.5), "0.500");
/// assert_eq!(format_probability(1.0 / 3.0), "0.333");
/// ```
pub fn format_probability(p: f64) -> String {
    format!("{:.3}", p)
}

/// Timestamp in the same layout the scan files use.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render a plain-text table: first column left-aligned, the rest
/// right-aligned, two spaces between columns and a dashed rule under the
/// header.
///
/// ```
/// use market_core::formatting::render_table;
///
/// let out = render_table(&["location", "count"], &[vec!["dairy".into(), "3".into()]]);
/// assert_eq!(out, "location  count\n--------  -----\ndairy         3\n");
/// ```
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    out.push_str(&render_line(&header_cells, &widths));
    out.push_str(&render_line(&rule, &widths));
    for row in rows {
        out.push_str(&render_line(row, &widths));
    }
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            if i == 0 {
                format!("{:<w$}", cell, w = w)
            } else {
                format!("{:>w$}", cell, w = w)
            }
        })
        .collect();
    let mut line = padded.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

//! Plain-text and JSON rendering of query results.

use fitdash_core::formatting::{
    format_cell, format_minutes, format_number, format_reading, format_timestamp, NO_READING,
};
use fitdash_core::models::{Reading, Resolution, SummaryResult, TableView};
use fitdash_data::summary::Headline;
use fitdash_data::unifier::CollisionDiagnostic;
use serde_json::{json, Value};
use unicode_width::UnicodeWidthStr;

// ── Table ──────────────────────────────────────────────────────────────────────

/// Render up to `limit` rows of `view` as an aligned text table.
pub fn render_rows(view: &TableView<'_>, limit: usize) -> String {
    let mut header = vec!["user".to_string(), "timestamp".to_string()];
    header.extend(view.columns().iter().map(|c| c.to_string()));

    let body: Vec<Vec<String>> = view
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            let mut cells = vec![
                row.user_id.to_string(),
                format_timestamp(row.timestamp, view.resolution()),
            ];
            cells.extend(row.values.iter().map(|v| format_cell(*v)));
            cells
        })
        .collect();

    let mut out = align(&header, &body);
    if view.len() > limit {
        out.push_str(&format!("... {} more rows\n", view.len() - limit));
    }
    out
}

/// Render per-metric statistics, one metric per line.
pub fn render_summary(summary: &SummaryResult) -> String {
    let header: Vec<String> = ["metric", "count", "sum", "mean", "min", "max"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let body: Vec<Vec<String>> = summary
        .iter()
        .map(|(name, s)| {
            vec![
                name.to_string(),
                s.count.to_string(),
                format_cell(s.sum),
                s.mean.map_or_else(|| NO_READING.to_string(), |m| format_number(m, 2)),
                format_cell(s.min),
                format_cell(s.max),
            ]
        })
        .collect();
    align(&header, &body)
}

/// Render the dashboard headline figures.
pub fn render_headline(headline: &Headline) -> String {
    let opt = |v: Option<f64>, decimals: u32| {
        v.map_or_else(|| NO_READING.to_string(), |v| format_number(v, decimals))
    };
    let total = |v: Option<Reading>| v.map_or_else(|| NO_READING.to_string(), format_reading);
    let sleep = |v: Option<f64>| v.map_or_else(|| NO_READING.to_string(), format_minutes);

    format!(
        "Total steps:        {}\n\
         Average steps:      {}\n\
         Total sleep:        {}\n\
         Average sleep:      {}\n\
         Average calories:   {}\n",
        total(headline.total_steps),
        opt(headline.avg_steps, 0),
        sleep(headline.total_minutes_asleep.map(|r| r.as_f64())),
        sleep(headline.avg_minutes_asleep),
        opt(headline.avg_calories, 0),
    )
}

/// Samples listed in the text collision note.
const COLLISION_TEXT_SAMPLES: usize = 5;

/// Note about overwritten entries; empty when there were none.
pub fn render_collisions(collisions: &CollisionDiagnostic, resolution: Resolution) -> String {
    if collisions.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "{} {} entries were supplied more than once; the last value was kept\n",
        format_number(collisions.count as f64, 0),
        resolution
    );
    for key in collisions.samples.iter().take(COLLISION_TEXT_SAMPLES) {
        out.push_str(&format!(
            "  user {} at {}: {}\n",
            key.user_id,
            format_timestamp(key.timestamp, resolution),
            key.metric
        ));
    }
    if collisions.count > COLLISION_TEXT_SAMPLES {
        out.push_str(&format!(
            "  ... {} more\n",
            collisions.count - COLLISION_TEXT_SAMPLES
        ));
    }
    out
}

// ── JSON ───────────────────────────────────────────────────────────────────────

/// Machine-readable form of one query.
pub fn render_json(
    view: &TableView<'_>,
    summary: &SummaryResult,
    headline: &Headline,
    collisions: &CollisionDiagnostic,
    limit: usize,
) -> Value {
    let rows: Vec<Value> = view
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            let values: serde_json::Map<String, Value> = view
                .columns()
                .iter()
                .zip(&row.values)
                .map(|(c, v)| (c.to_string(), json!(v)))
                .collect();
            json!({
                "user_id": row.user_id,
                "timestamp": row.timestamp.to_rfc3339(),
                "values": values,
            })
        })
        .collect();

    json!({
        "resolution": view.resolution(),
        "columns": view.columns(),
        "row_count": view.len(),
        "rows": rows,
        "summary": summary,
        "headline": headline,
        "collisions": collisions,
    })
}

// ── Internal helpers ───────────────────────────────────────────────────────────

/// Left-align the first two columns, right-align the rest.
fn align(header: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    let line = |cells: &[String]| -> String {
        let parts: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                let pad = " ".repeat(w.saturating_sub(cell.width()));
                if i < 2 {
                    format!("{cell}{pad}")
                } else {
                    format!("{pad}{cell}")
                }
            })
            .collect();
        format!("{}\n", parts.join("  ").trim_end())
    };

    let mut out = line(header);
    for row in body {
        out.push_str(&line(row));
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────

mod bootstrap;
mod render;

use anyhow::{Context, Result};
use fitdash_core::formatting::format_timestamp;
use fitdash_core::settings::Settings;
use fitdash_data::summary::{summarize, Headline};
use fitdash_runtime::manager::DatasetManager;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("fitdash v{} starting", env!("CARGO_PKG_VERSION"));

    let schema = bootstrap::load_schema(&settings.schema_path(), settings.schema.is_some())
        .context("loading column mapping")?;
    let parser = schema.timestamp_parser()?;
    // Bad flags fail before any file is read.
    let spec = settings.filter_spec(&parser)?;

    let manager = DatasetManager::new(schema, settings.data.clone());
    let dataset = manager.reload().context("building dataset")?;

    let report = dataset.report();
    tracing::info!(
        "Dataset built at {}: {} records from {} sources",
        dataset.built_at().to_rfc3339(),
        report.records_emitted(),
        report.sources.len()
    );
    for (source, err) in report.failures() {
        tracing::debug!("{}: {}", source, err);
    }
    for rejected in report.rejected_sources() {
        tracing::warn!("Source {} was not ingested", rejected.source_name);
    }
    if !report.is_clean() {
        tracing::warn!(
            "{} records could not be ingested (run with --debug for details)",
            report.error_count()
        );
    }

    let users = dataset.user_ids();
    let res = spec.resolution;
    match dataset.time_bounds(res) {
        Some((first, last)) => tracing::info!(
            "{} users, {} data from {} to {}",
            users.len(),
            res,
            format_timestamp(first, res),
            format_timestamp(last, res)
        ),
        None => tracing::info!("{} users, no {} data", users.len(), res),
    }

    let view = dataset.filter(&spec)?;
    let summary = summarize(&view);
    let headline = Headline::from_summary(&summary);
    let collisions = dataset.collisions(res).cloned().unwrap_or_default();

    match settings.format.as_str() {
        "json" => {
            let value =
                render::render_json(&view, &summary, &headline, &collisions, settings.limit);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            println!("{}", render::render_rows(&view, settings.limit));
            println!("{}", render::render_summary(&summary));
            print!("{}", render::render_headline(&headline));
            let note = render::render_collisions(&collisions, res);
            if !note.is_empty() {
                print!("\n{note}");
            }
        }
    }

    Ok(())
}

//! Script to export a saved search history snapshot as CSV files.
//!
//! Usage: `export-history [OUTPUT_DIR]` with `HISTORY_PATH` pointing at the
//! snapshot written by the server.

use dotenvy::dotenv;
use leadgen_dashboard::csv_export::{self, CsvFile, HistoryRow};
use leadgen_dashboard::history_store::load_snapshot;
use leadgen_dashboard::models::SearchResult;
use std::env;
use std::path::PathBuf;

/// Main entry point for the export script.
///
/// Writes one history overview file plus one leads file per search into the
/// output directory (default: current directory). A missing or corrupt
/// snapshot exports an empty history.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let snapshot = env::var("HISTORY_PATH")
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("HISTORY_PATH must be set"))?;
    let out_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let entries: Vec<SearchResult> = load_snapshot(&snapshot);
    tracing::info!(
        "Loaded {} searches from {}",
        entries.len(),
        snapshot.display()
    );

    let today = chrono::Utc::now().date_naive();
    let rows: Vec<HistoryRow> = entries.iter().map(HistoryRow::from).collect();
    CsvFile::new(
        csv_export::history_filename(today),
        csv_export::serialize(&rows, &csv_export::history_columns()),
    )
    .write_to_dir(&out_dir)?;

    for entry in &entries {
        CsvFile::new(
            csv_export::search_filename(&entry.id, today),
            csv_export::serialize(&entry.leads, &csv_export::search_entry_columns()),
        )
        .write_to_dir(&out_dir)?;
    }

    tracing::info!(
        "Export complete. Wrote {} files to {}",
        entries.len() + 1,
        out_dir.display()
    );

    Ok(())
}

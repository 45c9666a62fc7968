use anyhow::Result;
use lexigraph_core::{BatchReport, IngestOutcome};
use lexigraph_pipeline::{EntryIngestor, IngestOptions};
use lexigraph_sqlite::{SqliteConfig, SqliteGraphStore, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

pub async fn execute(
    db: PathBuf,
    language: String,
    files: Vec<PathBuf>,
    timeout_secs: u64,
) -> Result<()> {
    let pool = SqlitePool::new(SqliteConfig::new(&db))?;
    let store = Arc::new(SqliteGraphStore::new(pool));
    let ingestor = EntryIngestor::with_options(
        store,
        IngestOptions {
            language,
            store_timeout: Duration::from_secs(timeout_secs),
        },
    );

    let mut total = BatchReport::default();
    let mut unreadable_files = 0usize;

    for file in &files {
        match ingestor.ingest_file(file).await {
            Ok(report) => total.entries.extend(report.entries),
            Err(err) => {
                // A bad file never aborts the rest of the batch
                error!(file = %file.display(), error = %err, "Skipping file");
                unreadable_files += 1;
            }
        }
    }

    println!(
        "Ingested {} entries ({} skipped, {} failed) from {} files",
        total.ingested(),
        total.skipped(),
        total.failed(),
        files.len()
    );
    if unreadable_files > 0 {
        println!("  {} files could not be read", unreadable_files);
    }
    for entry in &total.entries {
        if let IngestOutcome::Failed { error } = &entry.outcome {
            println!("  failed: {} - {}", entry.label, error);
        }
    }

    Ok(())
}

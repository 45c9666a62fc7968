use anyhow::Result;
use lexigraph_core::GraphStore;
use lexigraph_sqlite::{SqliteConfig, SqliteGraphStore, SqlitePool};
use std::path::PathBuf;

pub async fn execute(db: PathBuf) -> Result<()> {
    let pool = SqlitePool::new(SqliteConfig::new(&db))?;
    let store = SqliteGraphStore::new(pool.clone());

    let graph = store.stats().await?;
    let file = pool.stats()?;

    println!("Word Graph Statistics\n");
    println!("  words:         {}", graph.words);
    println!("  definitions:   {}", graph.definitions);
    println!("  examples:      {}", graph.examples);
    println!("  relationships: {}", graph.relationships);
    println!("  audio:         {}", graph.audio);
    println!(
        "\nDatabase: {} ({:.1} KiB)",
        db.display(),
        file.total_size_bytes as f64 / 1024.0
    );

    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lexi")]
#[command(about = "lexi - Dictionary entry ingestion into a relational word graph")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file path
    #[arg(long, global = true, default_value = "lexigraph.db")]
    pub db: PathBuf,

    /// Language code stamped on ingested words
    #[arg(long, global = true, default_value = "en")]
    pub language: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest provider entry files into the word graph
    Ingest {
        /// JSON files to ingest, each holding one lookup response
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Storage timeout per entry, in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Show word graph row counts and database size
    Stats,
}

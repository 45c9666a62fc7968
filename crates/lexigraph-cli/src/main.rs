use anyhow::Result;
use clap::Parser;

use lexigraph_cli::{
    cli::{Cli, Commands},
    commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = format!(
        "lexigraph_cli={},lexigraph_pipeline={},lexigraph_parser={},lexigraph_sqlite={}",
        log_level, log_level, log_level, log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .init();

    match cli.command {
        Commands::Ingest { files, timeout } => {
            commands::ingest::execute(cli.db, cli.language, files, timeout).await?
        }
        Commands::Stats => commands::stats::execute(cli.db).await?,
    }

    Ok(())
}

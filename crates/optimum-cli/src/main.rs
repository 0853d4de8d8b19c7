//! Optimum client
//!
//! Command line access to the optimum vector service.
//!
//! # Usage
//!
//! ```bash
//! optimum list [--class hnsw]
//! optimum create --cask hnsw:example [-j opts.json]
//! optimum upload --cask hnsw:example [--chunk BYTES] data.txt
//! optimum stream --cask hnsw:example [--chunk RECORDS] data.txt
//! optimum commit --cask hnsw:example
//! optimum query --cask hnsw:example [-k 10] [--distance D] [-t texts.txt] query.txt
//! optimum status /jobs/...
//! optimum remove --cask hnsw:example
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/optimum/config.toml)
//! 3. Config file given with --config
//! 4. Environment variables (OPTIMUM_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use optimum_cli::{
    commit, create, init, list, query, remove, status, stream, upload, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = init(&cli)?;

    match &cli.command {
        Commands::List { class } => {
            list(&ctx, class).await?;
        }
        Commands::Create { cask, json } => {
            create(&ctx, cask, json.as_deref()).await?;
        }
        Commands::Commit { cask } => {
            commit(&ctx, cask).await?;
        }
        Commands::Remove { cask } => {
            remove(&ctx, cask).await?;
        }
        Commands::Upload { cask, chunk, file } => {
            upload(&ctx, cask, *chunk, file).await?;
        }
        Commands::Stream { cask, chunk, file } => {
            stream(&ctx, cask, *chunk, file).await?;
        }
        Commands::Query {
            cask,
            k,
            ef_search,
            distance,
            text,
            file,
        } => {
            query(&ctx, cask, *k, *ef_search, *distance, text.as_deref(), file).await?;
        }
        Commands::Status { job } => {
            status(&ctx, job).await?;
        }
    }

    Ok(())
}

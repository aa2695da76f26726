mod commands;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpDocumentCollection, TodoController, TodoItemStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    commands::Command,
    config::{load_settings, CliOverrides},
};

#[derive(Parser, Debug)]
#[command(name = "todo", about = "Manage todo items stored on a document server")]
struct Args {
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    collection: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(&CliOverrides {
        server_url: args.server_url,
        collection: args.collection,
        request_timeout_secs: args.timeout_secs,
    });
    info!(server_url = %settings.server_url, collection = %settings.collection, "connecting");

    let collection = HttpDocumentCollection::with_timeout(
        &settings.server_url,
        settings.collection.clone(),
        settings.request_timeout(),
    )
    .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let controller = Arc::new(TodoController::new(TodoItemStore::new(Arc::new(collection))));

    let mut stdout = std::io::stdout();
    commands::run(args.command, controller, &mut stdout).await
}

use std::{fs, io::Write, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::protocol::{is_valid_collection_name, is_valid_document_key, DocumentRecord};
use storage::Storage;

#[derive(Parser, Debug)]
#[command(about = "Offline maintenance for the document store database")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/documents.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List collections with their document counts.
    Collections,
    /// Write a collection as a JSON array of document records.
    Export {
        collection: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load document records from a JSON array, overwriting matching keys.
    Import {
        collection: String,
        file: PathBuf,
    },
    Purge {
        collection: String,
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open '{}'", cli.database_url))?;

    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Collections => list_collections(&storage, &mut stdout).await?,
        Command::Export { collection, out } => {
            let records = export_collection(&storage, &collection).await?;
            let encoded = serde_json::to_string_pretty(&records)?;
            match out {
                Some(path) => {
                    fs::write(&path, encoded)
                        .with_context(|| format!("failed to write '{}'", path.display()))?;
                    writeln!(stdout, "exported {} documents", records.len())?;
                }
                None => writeln!(stdout, "{encoded}")?,
            }
        }
        Command::Import { collection, file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            let imported = import_collection(&storage, &collection, &raw).await?;
            writeln!(stdout, "imported {imported} documents into {collection}")?;
        }
        Command::Purge { collection, yes } => {
            if !yes {
                bail!("refusing to purge '{collection}' without --yes");
            }
            let removed = storage.purge_collection(&collection).await?;
            writeln!(stdout, "removed {removed} documents from {collection}")?;
        }
    }

    Ok(())
}

async fn list_collections(storage: &Storage, out: &mut impl Write) -> Result<()> {
    let collections = storage.list_collections().await?;
    if collections.is_empty() {
        writeln!(out, "no collections")?;
    }
    for summary in collections {
        writeln!(out, "{}\t{}", summary.name, summary.document_count)?;
    }
    Ok(())
}

async fn export_collection(storage: &Storage, collection: &str) -> Result<Vec<DocumentRecord>> {
    ensure_collection_name(collection)?;
    Ok(storage
        .list_documents(collection)
        .await?
        .into_iter()
        .map(|document| DocumentRecord {
            key: document.key,
            data: document.body,
            updated_at: document.updated_at,
        })
        .collect())
}

/// Every record is checked before the first write, so a bad file imports nothing.
async fn import_collection(storage: &Storage, collection: &str, raw: &str) -> Result<usize> {
    ensure_collection_name(collection)?;
    let records: Vec<DocumentRecord> =
        serde_json::from_str(raw).context("import file is not a JSON array of document records")?;

    for record in &records {
        if !is_valid_document_key(&record.key) {
            bail!("invalid document key '{}'", record.key);
        }
        if !record.data.is_object() {
            bail!("document '{}' is not a JSON object", record.key);
        }
    }

    for record in &records {
        storage
            .put_document(collection, &record.key, &record.data)
            .await?;
    }
    Ok(records.len())
}

fn ensure_collection_name(collection: &str) -> Result<()> {
    if !is_valid_collection_name(collection) {
        bail!("invalid collection name '{collection}'");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub collection: String,
    pub key: String,
    pub body: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub name: String,
    pub document_count: i64,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Writes the whole document at `key`, replacing any previous body.
    pub async fn put_document(
        &self,
        collection: &str,
        key: &str,
        body: &serde_json::Value,
    ) -> Result<DateTime<Utc>> {
        let encoded = serde_json::to_string(body).context("failed to encode document body")?;
        let updated_at = Utc::now();
        sqlx::query(
            "INSERT INTO documents (collection, doc_key, body, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(collection, doc_key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(collection)
        .bind(key)
        .bind(encoded)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write document '{key}' in '{collection}'"))?;
        Ok(updated_at)
    }

    pub async fn get_document(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT collection, doc_key, body, updated_at FROM documents WHERE collection = ? AND doc_key = ?",
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to read document '{key}' in '{collection}'"))?;

        row.map(|row| document_from_row(&row)).transpose()
    }

    /// Returns whether a document was actually removed.
    pub async fn delete_document(&self, collection: &str, key: &str) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM documents WHERE collection = ? AND doc_key = ?")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete document '{key}' in '{collection}'"))?
            .rows_affected();
        Ok(removed > 0)
    }

    pub async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            "SELECT collection, doc_key, body, updated_at FROM documents
             WHERE collection = ?
             ORDER BY doc_key",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list documents in '{collection}'"))?;

        rows.iter().map(document_from_row).collect()
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        let rows = sqlx::query(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list collections")?;

        Ok(rows
            .into_iter()
            .map(|row| CollectionSummary {
                name: row.get::<String, _>(0),
                document_count: row.get::<i64, _>(1),
            })
            .collect())
    }

    pub async fn purge_collection(&self, collection: &str) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to purge collection '{collection}'"))?
            .rows_affected();
        Ok(removed)
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredDocument> {
    let key: String = row.try_get("doc_key")?;
    let raw_body: String = row.try_get("body")?;
    let body = serde_json::from_str(&raw_body)
        .with_context(|| format!("stored body for document '{key}' is not valid JSON"))?;
    Ok(StoredDocument {
        collection: row.try_get("collection")?,
        key,
        body,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

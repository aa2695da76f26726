use shared::{
    error::{ApiError, ErrorCode},
    protocol::{is_valid_collection_name, is_valid_document_key, DocumentRecord},
};
use storage::{Storage, StoredDocument};
use tracing::{debug, error};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_documents(
    ctx: &ApiContext,
    collection: &str,
) -> Result<Vec<DocumentRecord>, ApiError> {
    ensure_valid_collection(collection)?;
    let documents = ctx
        .storage
        .list_documents(collection)
        .await
        .map_err(internal)?;
    Ok(documents.into_iter().map(record_from_stored).collect())
}

pub async fn get_document(
    ctx: &ApiContext,
    collection: &str,
    key: &str,
) -> Result<DocumentRecord, ApiError> {
    ensure_valid_collection(collection)?;
    ensure_valid_key(key)?;
    ctx.storage
        .get_document(collection, key)
        .await
        .map_err(internal)?
        .map(record_from_stored)
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "document not found"))
}

pub async fn put_document(
    ctx: &ApiContext,
    collection: &str,
    key: &str,
    body: serde_json::Value,
) -> Result<DocumentRecord, ApiError> {
    ensure_valid_collection(collection)?;
    ensure_valid_key(key)?;
    if !body.is_object() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "document body must be a JSON object",
        ));
    }

    let updated_at = ctx
        .storage
        .put_document(collection, key, &body)
        .await
        .map_err(internal)?;
    debug!(collection, key, "document written");
    Ok(DocumentRecord {
        key: key.to_string(),
        data: body,
        updated_at,
    })
}

/// Deleting an absent document succeeds; the flag says whether anything was removed.
pub async fn delete_document(
    ctx: &ApiContext,
    collection: &str,
    key: &str,
) -> Result<bool, ApiError> {
    ensure_valid_collection(collection)?;
    ensure_valid_key(key)?;
    let removed = ctx
        .storage
        .delete_document(collection, key)
        .await
        .map_err(internal)?;
    debug!(collection, key, removed, "document delete handled");
    Ok(removed)
}

fn ensure_valid_collection(collection: &str) -> Result<(), ApiError> {
    if is_valid_collection_name(collection) {
        Ok(())
    } else {
        Err(ApiError::new(
            ErrorCode::Validation,
            "invalid collection name",
        ))
    }
}

fn ensure_valid_key(key: &str) -> Result<(), ApiError> {
    if is_valid_document_key(key) {
        Ok(())
    } else {
        Err(ApiError::new(ErrorCode::Validation, "invalid document key"))
    }
}

fn record_from_stored(document: StoredDocument) -> DocumentRecord {
    DocumentRecord {
        key: document.key,
        data: document.body,
        updated_at: document.updated_at,
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "storage operation failed");
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

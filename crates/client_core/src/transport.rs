use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use shared::{
    error::ApiError,
    protocol::{is_valid_document_key, DocumentRecord},
};
use tracing::debug;

use crate::{
    collection::{Document, DocumentCollection},
    error::StoreError,
};

/// Document collection served by the document store HTTP API.
pub struct HttpDocumentCollection {
    http: Client,
    server_url: Url,
    collection: String,
}

impl HttpDocumentCollection {
    pub fn new(server_url: &str, collection: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_client(Client::new(), server_url, collection)
    }

    pub fn with_timeout(
        server_url: &str,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| StoreError::Transport {
                operation: "build_client",
                source,
            })?;
        Self::with_client(http, server_url, collection)
    }

    pub fn with_client(
        http: Client,
        server_url: &str,
        collection: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let server_url =
            Url::parse(server_url).map_err(|_| StoreError::InvalidUrl(server_url.to_string()))?;
        if server_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(server_url.to_string()));
        }
        Ok(Self {
            http,
            server_url,
            collection: collection.into(),
        })
    }

    fn collection_url(&self) -> Result<Url, StoreError> {
        self.url_with_segments(&["collections", &self.collection, "documents"])
    }

    fn document_url(&self, key: &str) -> Result<Url, StoreError> {
        if !is_valid_document_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.url_with_segments(&["collections", &self.collection, "documents", key])
    }

    fn url_with_segments(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.server_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.server_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl DocumentCollection for HttpDocumentCollection {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn set(&self, key: &str, document: Value) -> Result<(), StoreError> {
        let response = self
            .http
            .put(self.document_url(key)?)
            .json(&document)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                operation: "set",
                source,
            })?;
        ensure_success(response, "set").await?;
        debug!(collection = %self.collection, key, "document set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.document_url(key)?)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                operation: "delete",
                source,
            })?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response, "delete").await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .http
            .get(self.document_url(key)?)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                operation: "get",
                source,
            })?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: DocumentRecord = ensure_success(response, "get")
            .await?
            .json()
            .await
            .map_err(|source| StoreError::Transport {
                operation: "get",
                source,
            })?;
        Ok(Some(record.data))
    }

    async fn get_all(&self) -> Result<Vec<Document>, StoreError> {
        let response = self
            .http
            .get(self.collection_url()?)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                operation: "get_all",
                source,
            })?;
        let records: Vec<DocumentRecord> = ensure_success(response, "get_all")
            .await?
            .json()
            .await
            .map_err(|source| StoreError::Transport {
                operation: "get_all",
                source,
            })?;
        Ok(records
            .into_iter()
            .map(|record| Document {
                key: record.key,
                data: record.data,
            })
            .collect())
    }
}

async fn ensure_success(response: Response, operation: &'static str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiError>().await {
        Ok(api_error) => api_error.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string(),
    };
    Err(StoreError::Rejected {
        operation,
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

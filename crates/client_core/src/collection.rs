use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub data: Value,
}

/// A remote, key-addressed collection of JSON documents.
///
/// `set` is a whole-document overwrite. `delete` of an absent key succeeds.
/// `get_all` makes no ordering promise.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;
    async fn set(&self, key: &str, document: Value) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn get_all(&self) -> Result<Vec<Document>, StoreError>;
}

pub struct InMemoryCollection {
    name: String,
    documents: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set(&self, key: &str, document: Value) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), document);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.documents.write().await.remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .map(|(key, data)| Document {
                key: key.clone(),
                data: data.clone(),
            })
            .collect())
    }
}

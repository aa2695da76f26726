use std::sync::Arc;

use serde_json::Value;
use shared::domain::{TodoItem, TODO_COLLECTION};
use tracing::{debug, error, warn};

use crate::{
    collection::{DocumentCollection, InMemoryCollection},
    error::StoreError,
};

/// Data access for todo items. Holds only the collection handle, so clones
/// are cheap and can be shared freely between controllers.
#[derive(Clone)]
pub struct TodoItemStore {
    collection: Arc<dyn DocumentCollection>,
}

impl TodoItemStore {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self { collection }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCollection::new(TODO_COLLECTION)))
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    pub async fn create(&self, item: &TodoItem) -> Result<(), StoreError> {
        self.write("create", item).await
    }

    pub async fn replace(&self, item: &TodoItem) -> Result<(), StoreError> {
        self.write("replace", item).await
    }

    pub async fn delete(&self, item: &TodoItem) -> Result<(), StoreError> {
        if item.id.is_empty() {
            error!(operation = "delete", "todo item has no id");
            return Err(StoreError::MissingId);
        }
        self.collection.delete(&item.id).await.map_err(|error| {
            error!(operation = "delete", key = %item.id, %error, "todo item delete failed");
            error
        })?;
        debug!(key = %item.id, "todo item deleted");
        Ok(())
    }

    /// All items in the order the backend returned them. Documents that fail
    /// to decode are skipped.
    pub async fn get_all(&self) -> Result<Vec<TodoItem>, StoreError> {
        let documents = self.collection.get_all().await.map_err(|error| {
            error!(operation = "get_all", %error, "todo item listing failed");
            error
        })?;

        let mut items = Vec::with_capacity(documents.len());
        for document in documents {
            match decode_item(&document.key, document.data) {
                Ok(item) => items.push(item),
                Err(error) => warn!(key = %document.key, %error, "skipping malformed todo item"),
            }
        }
        Ok(items)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<TodoItem>, StoreError> {
        if id.is_empty() {
            return Ok(None);
        }
        let document = self.collection.get(id).await.map_err(|error| {
            error!(operation = "get_by_id", key = id, %error, "todo item read failed");
            error
        })?;

        document
            .map(|data| decode_item(id, data))
            .transpose()
            .map_err(|error| {
                error!(operation = "get_by_id", key = id, %error, "todo item is malformed");
                error
            })
    }

    async fn write(&self, operation: &'static str, item: &TodoItem) -> Result<(), StoreError> {
        if item.id.is_empty() {
            error!(operation, "todo item has no id");
            return Err(StoreError::MissingId);
        }
        let document = serde_json::to_value(item).map_err(StoreError::Encode)?;
        self.collection
            .set(&item.id, document)
            .await
            .map_err(|error| {
                error!(operation, key = %item.id, %error, "todo item write failed");
                error
            })?;
        debug!(operation, key = %item.id, "todo item written");
        Ok(())
    }
}

/// The document key wins over whatever `id` the stored body carries.
fn decode_item(key: &str, data: Value) -> Result<TodoItem, StoreError> {
    let mut item: TodoItem = serde_json::from_value(data).map_err(|source| StoreError::Decode {
        key: key.to_string(),
        source,
    })?;
    item.id = key.to_string();
    Ok(item)
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;

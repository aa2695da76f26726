use std::sync::atomic::{AtomicU64, Ordering};

use shared::domain::{new_item_id, TodoItem};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{info, warn};

use crate::{
    error::{ControllerError, StoreError, ValidationError},
    store::TodoItemStore,
    subscription::ListSubscription,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerOperation {
    LoadAll,
    LoadById,
    Save,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Saved { id: String },
    Deleted { id: String },
    OperationFailed {
        operation: ControllerOperation,
        message: String,
    },
}

/// Checks run before any write reaches the store.
pub fn validate(item: &TodoItem) -> Result<(), ValidationError> {
    if item.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Mediates UI actions and the store, publishing the full item list and the
/// selected item as whole values.
pub struct TodoController {
    store: TodoItemStore,
    items: watch::Sender<Vec<TodoItem>>,
    selected: watch::Sender<Option<TodoItem>>,
    events: broadcast::Sender<ControllerEvent>,
    // Held across a write and its follow-up reload.
    write_lock: Mutex<()>,
    items_requested: AtomicU64,
    items_published: AtomicU64,
    selected_requested: AtomicU64,
    selected_published: AtomicU64,
}

impl TodoController {
    pub fn new(store: TodoItemStore) -> Self {
        let (items, _) = watch::channel(Vec::new());
        let (selected, _) = watch::channel(None);
        let (events, _) = broadcast::channel(256);
        Self {
            store,
            items,
            selected,
            events,
            write_lock: Mutex::new(()),
            items_requested: AtomicU64::new(0),
            items_published: AtomicU64::new(0),
            selected_requested: AtomicU64::new(0),
            selected_published: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &TodoItemStore {
        &self.store
    }

    pub fn subscribe_items(&self) -> watch::Receiver<Vec<TodoItem>> {
        self.items.subscribe()
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<TodoItem>> {
        self.selected.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_list(&self) -> ListSubscription {
        ListSubscription::new(self.subscribe_items())
    }

    pub fn items(&self) -> Vec<TodoItem> {
        self.items.borrow().clone()
    }

    pub fn selected(&self) -> Option<TodoItem> {
        self.selected.borrow().clone()
    }

    pub fn clear_selection(&self) {
        let ticket = self.selected_requested.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish_selected(ticket, None);
    }

    /// Replaces the published list with the store's current contents. On
    /// failure the previous list stays published.
    pub async fn load_all(&self) -> Result<(), ControllerError> {
        let ticket = self.items_requested.fetch_add(1, Ordering::SeqCst) + 1;
        match self.store.get_all().await {
            Ok(items) => {
                self.publish_items(ticket, items);
                Ok(())
            }
            Err(error) => Err(self.fail(ControllerOperation::LoadAll, error)),
        }
    }

    pub async fn load_by_id(&self, id: &str) -> Result<Option<TodoItem>, ControllerError> {
        let ticket = self.selected_requested.fetch_add(1, Ordering::SeqCst) + 1;
        match self.store.get_by_id(id).await {
            Ok(item) => {
                self.publish_selected(ticket, item.clone());
                Ok(item)
            }
            Err(error) => Err(self.fail(ControllerOperation::LoadById, error)),
        }
    }

    /// Creates the item when it has no id yet, replaces it otherwise, then
    /// reloads the list. Returns the item as written.
    pub async fn save(&self, item: TodoItem) -> Result<TodoItem, ControllerError> {
        validate(&item)?;

        let _guard = self.write_lock.lock().await;
        let (item, written) = if item.id.is_empty() {
            let item = TodoItem {
                id: new_item_id(),
                ..item
            };
            let written = self.store.create(&item).await;
            (item, written)
        } else {
            let written = self.store.replace(&item).await;
            (item, written)
        };
        if let Err(error) = written {
            return Err(self.fail(ControllerOperation::Save, error));
        }

        info!(id = %item.id, "todo item saved");
        let _ = self.events.send(ControllerEvent::Saved {
            id: item.id.clone(),
        });
        self.reload_after_write().await;
        Ok(item)
    }

    pub async fn delete(&self, item: &TodoItem) -> Result<(), ControllerError> {
        let _guard = self.write_lock.lock().await;
        if let Err(error) = self.store.delete(item).await {
            return Err(self.fail(ControllerOperation::Delete, error));
        }

        info!(id = %item.id, "todo item deleted");
        let _ = self.events.send(ControllerEvent::Deleted {
            id: item.id.clone(),
        });
        self.reload_after_write().await;
        Ok(())
    }

    // The write already succeeded; a failed reload is signalled by load_all itself.
    async fn reload_after_write(&self) {
        if let Err(error) = self.load_all().await {
            warn!(%error, "reload after write failed; keeping previous list");
        }
    }

    fn publish_items(&self, ticket: u64, items: Vec<TodoItem>) {
        self.items.send_if_modified(|current| {
            if ticket <= self.items_published.load(Ordering::SeqCst) {
                return false;
            }
            self.items_published.store(ticket, Ordering::SeqCst);
            *current = items;
            true
        });
    }

    fn publish_selected(&self, ticket: u64, item: Option<TodoItem>) {
        self.selected.send_if_modified(|current| {
            if ticket <= self.selected_published.load(Ordering::SeqCst) {
                return false;
            }
            self.selected_published.store(ticket, Ordering::SeqCst);
            *current = item;
            true
        });
    }

    fn fail(&self, operation: ControllerOperation, error: StoreError) -> ControllerError {
        let _ = self.events.send(ControllerEvent::OperationFailed {
            operation,
            message: error.to_string(),
        });
        ControllerError::Store(error)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

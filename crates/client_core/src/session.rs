use std::{future::Future, sync::Arc};

use shared::domain::TodoItem;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::{
    controller::{validate, TodoController},
    error::{ControllerError, ValidationError},
};

/// Scope for the operations a single screen starts. Closing or dropping the
/// session aborts whatever is still in flight.
pub struct TodoSession {
    controller: Arc<TodoController>,
    tasks: JoinSet<()>,
}

impl TodoSession {
    pub fn new(controller: Arc<TodoController>) -> Self {
        Self {
            controller,
            tasks: JoinSet::new(),
        }
    }

    pub fn controller(&self) -> &Arc<TodoController> {
        &self.controller
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn spawn_load_all(&mut self) {
        let controller = Arc::clone(&self.controller);
        self.spawn("load_all", async move { controller.load_all().await });
    }

    pub fn spawn_load_by_id(&mut self, id: impl Into<String>) {
        let controller = Arc::clone(&self.controller);
        let id = id.into();
        self.spawn("load_by_id", async move {
            controller.load_by_id(&id).await.map(|_| ())
        });
    }

    /// Validation happens here, before anything is spawned.
    pub fn spawn_save(&mut self, item: TodoItem) -> Result<(), ValidationError> {
        validate(&item)?;
        let controller = Arc::clone(&self.controller);
        self.spawn("save", async move { controller.save(item).await.map(|_| ()) });
        Ok(())
    }

    pub fn spawn_delete(&mut self, item: TodoItem) {
        let controller = Arc::clone(&self.controller);
        self.spawn("delete", async move { controller.delete(&item).await });
    }

    /// Waits until every operation started so far has finished.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            log_join_failure(joined);
        }
    }

    pub async fn close(mut self) {
        let cancelled = self.tasks.len();
        self.tasks.shutdown().await;
        debug!(cancelled, "todo session closed");
    }

    fn spawn<F>(&mut self, operation: &'static str, work: F)
    where
        F: Future<Output = Result<(), ControllerError>> + Send + 'static,
    {
        while let Some(joined) = self.tasks.try_join_next() {
            log_join_failure(joined);
        }
        self.tasks.spawn(async move {
            if let Err(error) = work.await {
                debug!(operation, %error, "session operation failed");
            }
        });
    }
}

fn log_join_failure(joined: Result<(), tokio::task::JoinError>) {
    if let Err(join_error) = joined {
        if join_error.is_panic() {
            error!(%join_error, "session operation panicked");
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

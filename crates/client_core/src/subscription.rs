use shared::domain::TodoItem;
use tokio::sync::watch;

use crate::reconcile::{diff, ListDiff};

/// Tracks what an observer has rendered and turns each newly published list
/// into a row diff.
pub struct ListSubscription {
    receiver: watch::Receiver<Vec<TodoItem>>,
    rendered: Vec<TodoItem>,
}

impl ListSubscription {
    pub fn new(receiver: watch::Receiver<Vec<TodoItem>>) -> Self {
        Self {
            receiver,
            rendered: Vec::new(),
        }
    }

    pub fn rendered(&self) -> &[TodoItem] {
        &self.rendered
    }

    /// Diffs the currently published list without waiting for a change.
    pub fn take_current(&mut self) -> ListDiff {
        let next = self.receiver.borrow_and_update().clone();
        self.render(next)
    }

    /// Waits for the next publication. `None` once the controller is gone.
    pub async fn next_diff(&mut self) -> Option<ListDiff> {
        self.receiver.changed().await.ok()?;
        let next = self.receiver.borrow_and_update().clone();
        Some(self.render(next))
    }

    fn render(&mut self, next: Vec<TodoItem>) -> ListDiff {
        let changes = diff(&self.rendered, &next);
        self.rendered = next;
        changes
    }
}

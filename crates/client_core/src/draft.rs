use chrono::{DateTime, Utc};
use shared::domain::TodoItem;

use crate::{controller::validate, error::ValidationError};

/// Editable copy of an item on the details screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    original: Option<TodoItem>,
    pub name: String,
    pub notes: String,
    pub completed: bool,
    pub has_due_date: bool,
    pub due_date: Option<DateTime<Utc>>,
}

impl TodoDraft {
    pub fn new_item() -> Self {
        Self {
            original: None,
            name: String::new(),
            notes: String::new(),
            completed: false,
            has_due_date: false,
            due_date: None,
        }
    }

    pub fn edit(item: &TodoItem) -> Self {
        Self {
            original: Some(item.clone()),
            name: item.name.clone(),
            notes: item.notes.clone(),
            completed: item.completed,
            has_due_date: item.has_due_date,
            due_date: item.has_due_date.then_some(item.due_date),
        }
    }

    pub fn original(&self) -> Option<&TodoItem> {
        self.original.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    pub fn can_delete(&self) -> bool {
        self.original
            .as_ref()
            .is_some_and(TodoItem::is_persisted)
    }

    pub fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.has_due_date = due_date.is_some();
        if due_date.is_some() {
            self.due_date = due_date;
        }
    }

    /// Unsaved edits compared with what the draft started from. A picked
    /// date only counts while the due date switch is on.
    pub fn has_changes(&self) -> bool {
        let baseline = match &self.original {
            Some(item) => Self::edit(item),
            None => Self::new_item(),
        };
        let due_dates_differ = if self.has_due_date || baseline.has_due_date {
            self.has_due_date != baseline.has_due_date || self.due_date != baseline.due_date
        } else {
            false
        };

        self.name != baseline.name
            || self.notes != baseline.notes
            || self.completed != baseline.completed
            || due_dates_differ
    }

    /// Builds the item to save. An undated edit keeps the stored date; a new
    /// undated item, or a switched-on date with none picked, gets `now`.
    pub fn to_item(&self, now: DateTime<Utc>) -> Result<TodoItem, ValidationError> {
        let item = TodoItem {
            id: self
                .original
                .as_ref()
                .map(|item| item.id.clone())
                .unwrap_or_default(),
            name: self.name.clone(),
            notes: self.notes.clone(),
            due_date: match (self.has_due_date, self.due_date, &self.original) {
                (true, Some(picked), _) => picked,
                (false, _, Some(original)) => original.due_date,
                _ => now,
            },
            completed: self.completed,
            has_due_date: self.has_due_date,
        };
        validate(&item)?;
        Ok(item)
    }
}

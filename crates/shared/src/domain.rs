use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TODO_COLLECTION: &str = "todoItems";

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Fresh document key for an item saved for the first time.
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// A single todo entry as stored in the `todoItems` collection.
///
/// An empty `id` marks an item that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub name: String,
    pub notes: String,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub has_due_date: bool,
}

impl Default for TodoItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            notes: String::new(),
            due_date: Utc::now(),
            completed: false,
            has_due_date: false,
        }
    }
}

impl TodoItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = due_date;
        self.has_due_date = true;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Row identity: same logical item regardless of the other fields.
    pub fn same_row(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Value equality over all six fields.
    pub fn content_eq(&self, other: &Self) -> bool {
        self == other
    }

    /// Equality as seen by a list row. The due date only counts while one of
    /// the two sides actually has a due date.
    pub fn renders_same(&self, other: &Self) -> bool {
        let due_dates_match = if self.has_due_date || other.has_due_date {
            self.has_due_date == other.has_due_date && self.due_date == other.due_date
        } else {
            true
        };
        self.id == other.id
            && self.name == other.name
            && self.notes == other.notes
            && self.completed == other.completed
            && due_dates_match
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.has_due_date && self.due_date < now
    }

    pub fn due_label(&self) -> Option<String> {
        self.has_due_date
            .then(|| self.due_date.format(DUE_DATE_FORMAT).to_string())
    }
}

pub mod collection;
pub mod controller;
pub mod draft;
pub mod error;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod subscription;
pub mod transport;

pub use collection::{Document, DocumentCollection, InMemoryCollection};
pub use controller::{validate, ControllerEvent, ControllerOperation, TodoController};
pub use draft::TodoDraft;
pub use error::{ControllerError, StoreError, ValidationError};
pub use reconcile::{diff, ListDiff, Move};
pub use session::TodoSession;
pub use store::TodoItemStore;
pub use subscription::ListSubscription;
pub use transport::HttpDocumentCollection;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

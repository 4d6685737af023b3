//! Remote task store
//!
//! The board never owns task data; it reads and mutates it through a
//! [`TaskStore`]. Two implementations ship here: an HTTP client for the
//! real store and an in-process store for tests and offline use.

mod http;
mod memory;
mod repository;

pub use http::HttpTaskStore;
pub use memory::{FailureMode, InMemoryTaskStore, StoreCall, StoreOp};
pub use repository::{ListQuery, TaskStore};

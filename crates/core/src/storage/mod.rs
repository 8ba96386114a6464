//! Storage module
//!
//! Key-value backends and the adapter that persists the task collection.

mod backend;
mod persistence;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use persistence::{StoredTasks, TaskPersistence};

//! Task module
//!
//! This module contains the task model, the list filter and the store.

mod filter;
mod id;
mod model;
mod store;

pub use filter::{StatusFilter, TaskFilter};
pub use id::TaskIdGenerator;
pub use model::*;
pub use store::{ActiveTasks, TaskStore};

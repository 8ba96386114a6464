//! Core library for the task store
//!
//! This crate contains the whole to-do core:
//! - Task model and identifier generation
//! - Key-value persistence of the task collection
//! - The reactive task store and the list filter

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod task;

pub use config::StoreConfig;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

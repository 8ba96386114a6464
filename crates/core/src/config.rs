//! Store configuration

use serde::Deserialize;
use std::path::PathBuf;

use crate::{Error, Result};

/// Key the task collection is stored under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

/// Owner tag stamped on new tasks that don't carry one
pub const DEFAULT_USER_ID: i64 = 1;

/// Settings for opening a file-backed task store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Directory holding one JSON file per storage key
    pub data_dir: PathBuf,
    /// Key the task collection is persisted under
    pub storage_key: String,
    /// Owner assigned to created tasks without a `user_id`
    pub default_user_id: Option<i64>,
    /// Pretty-print the persisted JSON
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".todo-data"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_user_id: Some(DEFAULT_USER_ID),
            pretty: true,
        }
    }
}

impl StoreConfig {
    /// Create a config rooted at the given data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Set the storage key
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the default owner; `None` leaves created tasks untagged
    pub fn with_default_user_id(mut self, user_id: Option<i64>) -> Self {
        self.default_user_id = user_id;
        self
    }

    /// Toggle pretty-printed output
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Check the config before it is used to open a store.
    ///
    /// The storage key doubles as a file name, so it must be non-empty and
    /// free of path separators.
    pub fn validate(&self) -> Result<()> {
        let key = self.storage_key.trim();
        if key.is_empty() {
            return Err(Error::InvalidInput("storage key must not be empty".into()));
        }
        if key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(Error::InvalidInput(format!(
                "storage key must be a plain name: {}",
                self.storage_key
            )));
        }
        Ok(())
    }
}

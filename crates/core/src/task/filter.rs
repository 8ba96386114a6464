//! List filtering by status and free-text search

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::model::{Task, TaskStatus};
use crate::Error;

/// Which statuses a filtered list keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

impl From<TaskStatus> for StatusFilter {
    fn from(status: TaskStatus) -> Self {
        Self::Only(status)
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Only(status) => status.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Status plus case-insensitive search, as applied by a list view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: StatusFilter,
    /// Substring searched in titles; empty matches everything
    pub search: String,
    /// Also search descriptions
    pub match_description: bool,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status filter
    pub fn with_status(mut self, status: impl Into<StatusFilter>) -> Self {
        self.status = status.into();
        self
    }

    /// Set the search term
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Toggle description matching
    pub fn with_match_description(mut self, match_description: bool) -> Self {
        self.match_description = match_description;
        self
    }

    /// Whether `task` passes both the status and the search check
    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task.status) && self.matches_search(task, &self.search.to_lowercase())
    }

    /// Keep the matching tasks, in their original order
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Task> {
        tasks
            .into_iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect()
    }

    fn matches_search(&self, task: &Task, needle: &str) -> bool {
        if needle.is_empty() || task.title.to_lowercase().contains(needle) {
            return true;
        }
        self.match_description
            && task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

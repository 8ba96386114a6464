//! Persistence adapter for the task collection
//!
//! The whole collection lives as one JSON array under a single key of a
//! [`KeyValueBackend`]. Reads are tolerant of older record layouts:
//! - `isArchived` (inverted) in place of `isActive`
//! - missing `userId`, `status` or `priority`
//! - locale (`MM/DD/YYYY`, `DD/MM/YYYY`, `DD.MM.YYYY`) or RFC 3339 dates
//!
//! Writes always use the current [`Task`] layout. Records that still can't be
//! decoded are carried along verbatim, so only a clear removes them.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::KeyValueBackend;
use crate::config::DEFAULT_STORAGE_KEY;
use crate::task::{Task, TaskPriority, TaskStatus};
use crate::Result;

/// Reads and writes the full task collection under one key
#[derive(Debug, Clone)]
pub struct TaskPersistence<B> {
    backend: B,
    key: String,
    pretty: bool,
}

impl<B: KeyValueBackend> TaskPersistence<B> {
    /// Adapter over `backend` using the default `"tasks"` key
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            key: DEFAULT_STORAGE_KEY.to_string(),
            pretty: true,
        }
    }

    /// Use a different storage key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Toggle pretty-printed output
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Load the stored collection.
    ///
    /// A missing key yields an empty collection. So does a blob that isn't a
    /// JSON array, with a warning. Records that can't be decoded are left
    /// out; use [`load_stored`](Self::load_stored) to keep them.
    pub async fn load(&self) -> Result<Vec<Task>> {
        Ok(self.load_stored().await?.tasks)
    }

    /// Load the stored collection, keeping undecodable records verbatim
    pub async fn load_stored(&self) -> Result<StoredTasks> {
        let Some(content) = self.backend.get(&self.key).await? else {
            debug!(key = %self.key, "No stored tasks");
            return Ok(StoredTasks::default());
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored tasks are unreadable, starting empty");
                return Ok(StoredTasks::default());
            }
        };

        let total = records.len();
        let mut stored = StoredTasks::default();
        for (index, value) in records.into_iter().enumerate() {
            match decode_record(value.clone()) {
                Ok(task) => stored.tasks.push(task),
                Err(reason) => {
                    warn!(key = %self.key, index, %reason, "Keeping undecodable stored task as is");
                    stored.unreadable.push(value);
                }
            }
        }

        debug!(
            key = %self.key,
            loaded = stored.tasks.len(),
            unreadable = stored.unreadable.len(),
            total,
            "Loaded tasks"
        );
        Ok(stored)
    }

    /// Overwrite the stored collection with `tasks`
    pub async fn save(&self, tasks: &[Task]) -> Result<()> {
        self.save_stored(tasks, &[]).await
    }

    /// Overwrite the stored collection with `tasks` followed by `unreadable`
    pub async fn save_stored(&self, tasks: &[Task], unreadable: &[serde_json::Value]) -> Result<()> {
        let records: Vec<Record<'_>> = tasks
            .iter()
            .map(Record::Task)
            .chain(unreadable.iter().map(Record::Raw))
            .collect();
        let content = if self.pretty {
            serde_json::to_string_pretty(&records)?
        } else {
            serde_json::to_string(&records)?
        };
        self.backend.set(&self.key, &content).await?;
        debug!(key = %self.key, count = records.len(), "Saved tasks");
        Ok(())
    }

    /// Remove the stored collection entirely
    pub async fn clear(&self) -> Result<()> {
        self.backend.remove(&self.key).await
    }
}

/// Result of a tolerant load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredTasks {
    /// Decoded tasks, in stored order
    pub tasks: Vec<Task>,
    /// Records that couldn't be decoded, kept so a save doesn't erase them
    pub unreadable: Vec<serde_json::Value>,
}

impl StoredTasks {
    /// Every id in use, readable or not
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.tasks
            .iter()
            .map(|t| t.id)
            .chain(self.unreadable.iter().filter_map(|v| v.get("id")?.as_i64()))
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Record<'a> {
    Task(&'a Task),
    Raw(&'a serde_json::Value),
}

/// A task record as it may appear at rest, across layout revisions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    priority: TaskPriority,
    date: String,
    is_active: Option<bool>,
    is_archived: Option<bool>,
    #[serde(default)]
    user_id: Option<i64>,
}

fn decode_record(value: serde_json::Value) -> std::result::Result<Task, String> {
    let stored: StoredTask = serde_json::from_value(value).map_err(|e| e.to_string())?;
    let date = parse_date(&stored.date)
        .ok_or_else(|| format!("unrecognized date {:?}", stored.date))?;
    let is_active = stored
        .is_active
        .or(stored.is_archived.map(|archived| !archived))
        .unwrap_or(true);

    Ok(Task {
        id: stored.id,
        title: stored.title,
        description: stored.description,
        status: stored.status,
        priority: stored.priority,
        date,
        is_active,
        user_id: stored.user_id,
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .ok()
        .or_else(|| {
            // Datepickers store local midnight as UTC
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Local).date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_key_is_empty() {
        let persistence = TaskPersistence::new(MemoryBackend::new());
        assert!(persistence.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_every_field() {
        let persistence = TaskPersistence::new(MemoryBackend::new()).with_pretty(false);

        let mut first = Task::new("Buy milk")
            .with_description("2 liters")
            .with_priority(TaskPriority::Medium)
            .with_date(date(2026, 1, 2))
            .with_user_id(1);
        first.id = 1_700_000_000_000;
        let mut second = Task::new("Write report")
            .with_status(TaskStatus::Completed)
            .with_date(date(2026, 2, 3));
        second.id = 1_700_000_000_001;
        second.is_active = false;

        let tasks = vec![first, second];
        persistence.save(&tasks).await.unwrap();

        assert_eq!(persistence.load().await.unwrap(), tasks);
    }

    #[tokio::test]
    async fn test_clear_removes_key() {
        let backend = MemoryBackend::new();
        let persistence = TaskPersistence::new(backend.clone()).with_key("todo");

        persistence.save(&[Task::new("x")]).await.unwrap();
        assert!(backend.get("todo").await.unwrap().is_some());

        persistence.clear().await.unwrap();
        assert!(backend.get("todo").await.unwrap().is_none());
        assert!(persistence.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_loads_empty() {
        let backend = MemoryBackend::new();
        backend.set("tasks", "{not json").await.unwrap();

        let persistence = TaskPersistence::new(backend);
        assert!(persistence.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_records() {
        let backend = MemoryBackend::new();
        backend
            .set(
                "tasks",
                r#"[
                    {"id": 1, "title": "Archived", "status": "completed",
                     "priority": "high", "date": "10/19/2024", "isArchived": true},
                    {"id": 2, "title": "Kept", "status": "on-hold",
                     "priority": "low", "date": "2024-10-20T08:30:00.000Z", "isArchived": false},
                    {"id": 3, "title": "Bare", "date": "2024-10-21"},
                    {"id": 4, "title": "Bad date", "status": "pending",
                     "priority": "low", "date": "someday", "isActive": true},
                    {"title": "No id", "date": "2024-10-21"}
                ]"#,
            )
            .await
            .unwrap();

        let stored = TaskPersistence::new(backend).load_stored().await.unwrap();
        let tasks = &stored.tasks;
        assert_eq!(tasks.len(), 3);
        assert_eq!(stored.unreadable.len(), 2);
        assert_eq!(stored.unreadable[0]["id"], 4);
        assert_eq!(stored.ids().collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        assert_eq!(tasks[0].id, 1);
        assert!(!tasks[0].is_active);
        assert_eq!(tasks[0].date, date(2024, 10, 19));
        assert_eq!(tasks[0].priority, TaskPriority::High);

        assert!(tasks[1].is_active);
        assert_eq!(tasks[1].status, TaskStatus::OnHold);
        assert_eq!(
            tasks[1].date,
            DateTime::parse_from_rfc3339("2024-10-20T08:30:00.000Z")
                .unwrap()
                .with_timezone(&Local)
                .date_naive()
        );

        assert!(tasks[2].is_active);
        assert_eq!(tasks[2].status, TaskStatus::Pending);
        assert_eq!(tasks[2].priority, TaskPriority::Low);
        assert!(tasks[2].user_id.is_none());
    }

    #[test]
    fn test_is_active_wins_over_is_archived() {
        let task = decode_record(serde_json::json!({
            "id": 5, "title": "t", "date": "2024-01-01",
            "isActive": false, "isArchived": false
        }))
        .unwrap();
        assert!(!task.is_active);
    }

    #[tokio::test]
    async fn test_save_stored_writes_unreadable_records_back() {
        let backend = MemoryBackend::new();
        backend
            .set(
                "tasks",
                r#"[{"id": 1, "title": "Fine", "date": "2026-10-19"},
                    {"id": 2, "title": "Odd", "date": "next week", "extra": [1, 2]}]"#,
            )
            .await
            .unwrap();
        let persistence = TaskPersistence::new(backend.clone());

        let stored = persistence.load_stored().await.unwrap();
        persistence
            .save_stored(&stored.tasks, &stored.unreadable)
            .await
            .unwrap();

        let raw = backend.get("tasks").await.unwrap().unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["isActive"], true);
        assert_eq!(
            records[1],
            serde_json::json!({"id": 2, "title": "Odd", "date": "next week", "extra": [1, 2]})
        );
    }

    #[test]
    fn test_parse_locale_dates() {
        assert_eq!(parse_date("2026-10-19"), Some(date(2026, 10, 19)));
        assert_eq!(parse_date("10/19/2026"), Some(date(2026, 10, 19)));
        assert_eq!(parse_date("19/10/2026"), Some(date(2026, 10, 19)));
        assert_eq!(parse_date("19.10.2026"), Some(date(2026, 10, 19)));
        // Month-first wins when both readings are valid
        assert_eq!(parse_date("03/04/2026"), Some(date(2026, 3, 4)));
        assert_eq!(parse_date("someday"), None);
    }

    #[test]
    fn test_parse_timestamp_uses_local_date() {
        let raw = "2026-10-18T22:00:00.000Z";
        let expected = DateTime::parse_from_rfc3339(raw)
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(parse_date(raw), Some(expected));
    }
}

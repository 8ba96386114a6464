//! Reactive task store
//!
//! Holds every task ever created (soft-deleted ones included), persists the
//! full collection after each mutation and publishes the active tasks to
//! subscribers through a [`watch`] channel.

use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use super::filter::TaskFilter;
use super::id::TaskIdGenerator;
use super::model::Task;
use crate::config::StoreConfig;
use crate::storage::{FileBackend, KeyValueBackend, StoredTasks, TaskPersistence};
use crate::Result;

/// Snapshot of the active tasks, in insertion order
pub type ActiveTasks = Arc<[Task]>;

struct StoreState {
    tasks: Vec<Task>,
    /// Stored records that couldn't be decoded; written back on every save
    unreadable: Vec<serde_json::Value>,
    ids: TaskIdGenerator,
}

/// Task store over a persistence adapter
pub struct TaskStore<B> {
    persistence: TaskPersistence<B>,
    state: RwLock<StoreState>,
    active_tx: watch::Sender<ActiveTasks>,
    default_user_id: Option<i64>,
}

impl TaskStore<FileBackend> {
    /// Open a file-backed store as described by `config`
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let persistence = TaskPersistence::new(FileBackend::new(&config.data_dir))
            .with_key(config.storage_key.trim())
            .with_pretty(config.pretty);
        Ok(Self::new(persistence)
            .await?
            .with_default_user_id(config.default_user_id))
    }
}

impl<B: KeyValueBackend> TaskStore<B> {
    /// Create a store, loading the persisted collection once
    pub async fn new(persistence: TaskPersistence<B>) -> Result<Self> {
        let stored = persistence.load_stored().await?;
        let ids = TaskIdGenerator::seeded(stored.ids());
        let (active_tx, _) = watch::channel(active_view(&stored.tasks));
        let StoredTasks { tasks, unreadable } = stored;

        Ok(Self {
            persistence,
            state: RwLock::new(StoreState {
                tasks,
                unreadable,
                ids,
            }),
            active_tx,
            default_user_id: None,
        })
    }

    /// Owner stamped on created tasks that have no `user_id`
    pub fn with_default_user_id(mut self, user_id: Option<i64>) -> Self {
        self.default_user_id = user_id;
        self
    }

    pub fn persistence(&self) -> &TaskPersistence<B> {
        &self.persistence
    }

    /// Subscribe to the active view.
    ///
    /// The receiver holds the current snapshot right away and is notified
    /// of every later publication.
    pub fn subscribe(&self) -> watch::Receiver<ActiveTasks> {
        self.active_tx.subscribe()
    }

    /// Current active view
    pub fn active_tasks(&self) -> ActiveTasks {
        self.active_tx.borrow().clone()
    }

    /// Every stored task, soft-deleted ones included
    pub async fn all_tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    /// Look up any stored task by id
    pub async fn get(&self, id: i64) -> Option<Task> {
        let state = self.state.read().await;
        state.tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Active tasks passing `filter`
    pub fn filtered(&self, filter: &TaskFilter) -> Vec<Task> {
        filter.apply(self.active_tasks().iter())
    }

    /// Add a task under a fresh id and return it as stored.
    ///
    /// Any id on `task` is ignored and the task is always active.
    pub async fn create(&self, mut task: Task) -> Result<Task> {
        let mut state = self.state.write().await;
        task.id = state.ids.next_id()?;
        task.is_active = true;
        if task.user_id.is_none() {
            task.user_id = self.default_user_id;
        }

        let mut tasks = state.tasks.clone();
        tasks.push(task.clone());
        self.commit(&mut state, tasks).await?;

        debug!(id = task.id, title = %task.title, "Created task");
        Ok(task)
    }

    /// Replace the stored task with the same id.
    ///
    /// Returns `false` when no task has that id; the collection is then
    /// left as it was but still persisted and republished.
    pub async fn update(&self, task: Task) -> Result<bool> {
        let mut state = self.state.write().await;
        let mut tasks = state.tasks.clone();
        let found = match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        };
        self.commit(&mut state, tasks).await?;
        Ok(found)
    }

    /// Soft-delete the task with `id`.
    ///
    /// Returns `false` when no task has that id. Deleting twice is harmless.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let mut tasks = state.tasks.clone();
        let found = match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.is_active = false;
                true
            }
            None => false,
        };
        self.commit(&mut state, tasks).await?;
        Ok(found)
    }

    /// Drop every task, including soft-deleted ones, and the stored blob
    pub async fn clear_all(&self) -> Result<()> {
        let mut state = self.state.write().await;
        self.persistence.clear().await?;
        let removed = state.tasks.len();
        state.tasks.clear();
        state.unreadable.clear();
        self.publish(&state.tasks);
        info!(removed, "Cleared all tasks");
        Ok(())
    }

    /// Persist `tasks`, then adopt and publish them
    async fn commit(&self, state: &mut StoreState, tasks: Vec<Task>) -> Result<()> {
        self.persistence
            .save_stored(&tasks, &state.unreadable)
            .await?;
        state.tasks = tasks;
        self.publish(&state.tasks);
        Ok(())
    }

    fn publish(&self, tasks: &[Task]) {
        self.active_tx.send_replace(active_view(tasks));
    }
}

fn active_view(tasks: &[Task]) -> ActiveTasks {
    tasks.iter().filter(|t| t.is_active).cloned().collect()
}

//! Time-derived task identifiers

use chrono::Utc;

use crate::{Error, Result};

/// Issues millisecond-timestamp ids that never repeat or go backwards.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    last: i64,
}

impl TaskIdGenerator {
    /// Start above every id already in use
    pub fn seeded(existing: impl IntoIterator<Item = i64>) -> Self {
        Self {
            last: existing.into_iter().max().unwrap_or(0),
        }
    }

    /// Next id: the current time in ms, bumped past the last one issued.
    ///
    /// Fails once an id of `i64::MAX` has been seen, since every later id
    /// would collide.
    pub fn next_id(&mut self) -> Result<i64> {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_ms: i64) -> Result<i64> {
        let bumped = self
            .last
            .checked_add(1)
            .ok_or_else(|| Error::Storage("task id space exhausted".into()))?;
        self.last = now_ms.max(bumped);
        Ok(self.last)
    }
}

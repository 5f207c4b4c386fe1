use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for task completions
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskCompletionRow {
    pub task_id: i64,
    pub date: NaiveDate,
    pub completed_by: String,
    pub completed: bool,
}

impl TaskCompletionRow {
    pub fn to_shared(&self) -> shared::CompletionRecord {
        shared::CompletionRecord {
            task_id: self.task_id,
            date: self.date,
            completed_by: self.completed_by.clone(),
            completed: self.completed,
        }
    }
}

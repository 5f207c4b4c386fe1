use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for catalog tasks
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: i64,
    pub name: String,
    pub avatar_number: i64,
    pub icon: Option<String>,
}

impl TaskRow {
    pub fn to_shared(&self) -> shared::Task {
        shared::Task {
            id: self.id,
            name: self.name.clone(),
            avatar_number: self.avatar_number,
            icon: self.icon.clone(),
        }
    }
}

/// A task left-joined with its completion for one date
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskViewRow {
    pub id: i64,
    pub name: String,
    pub avatar_number: i64,
    pub completed: bool,
    pub completed_by: String,
}

impl TaskViewRow {
    pub fn to_shared(&self) -> shared::TaskView {
        shared::TaskView {
            id: self.id,
            name: self.name.clone(),
            avatar_number: self.avatar_number,
            completed: self.completed,
            completed_by: self.completed_by.clone(),
        }
    }
}

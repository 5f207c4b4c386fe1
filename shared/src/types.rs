use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Types
// ============================================================================

/// A chore in the household catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub avatar_number: i64,
    pub icon: Option<String>,
}

/// A task joined with its completion status for one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: i64,
    pub name: String,
    pub avatar_number: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_by: String,
}

// ============================================================================
// Completion Types
// ============================================================================

/// A person's completion mark for a task on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub task_id: i64,
    pub date: NaiveDate,
    pub completed_by: String,
    pub completed: bool,
}

/// Body of `POST /tasks`. Every field is optional.
///
/// `date` is kept as a raw string so a malformed value can be reported as a
/// validation error instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRequest {
    pub date: Option<String>,
    pub task_id: Option<i64>,
    pub completed: Option<bool>,
    pub completed_by: Option<String>,
    #[serde(default)]
    pub export_csv: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskView>,
}

// ============================================================================
// Weekly Table Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeekQuery {
    pub date: Option<String>,
}

/// Who completed a task on one day of the week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub completed_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTaskRow {
    pub id: i64,
    pub name: String,
    pub avatar_number: i64,
    pub days: Vec<DayCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonStats {
    pub name: String,
    pub completed: i64,
    /// Share of the catalog completed by this person, 0-100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_tasks: i64,
    pub people: Vec<PersonStats>,
}

/// Monday to Sunday overview of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTable {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub tasks: Vec<WeeklyTaskRow>,
    pub stats: Vec<DailyStats>,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! CSV rendering of a day's task list.
//!
//! Fields are joined with commas without quoting. Task names come from the
//! household's own catalog, so they are not escaped.

use chrono::NaiveDate;
use shared::TaskView;

pub const CSV_HEADER: &str = "Task Name,Avatar Number,Completed,Completed By";

/// Header plus one line per task, in list order, without a trailing newline
pub fn render_csv(tasks: &[TaskView]) -> String {
    let mut lines = Vec::with_capacity(tasks.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for task in tasks {
        lines.push(format!(
            "{},{},{},{}",
            task.name, task.avatar_number, task.completed, task.completed_by
        ));
    }

    lines.join("\n")
}

pub fn csv_filename(date: NaiveDate) -> String {
    format!("tasks-{}.csv", date.format("%Y-%m-%d"))
}

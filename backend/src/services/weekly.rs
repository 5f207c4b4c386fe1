use chrono::{Datelike, Duration, NaiveDate};
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

use crate::services::tasks::{self as task_service, TaskError};
use shared::{CompletionRecord, DailyStats, DayCell, PersonStats, Task, WeeklyTable, WeeklyTaskRow};

/// Monday of the week containing `date`
pub fn get_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Sunday of the week starting at `week_start`
pub fn get_week_end(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

pub async fn get_weekly_table(
    pool: &SqlitePool,
    date: NaiveDate,
    members: &[String],
) -> Result<WeeklyTable, TaskError> {
    let week_start = get_week_start(date);
    let week_end = get_week_end(week_start);

    let tasks = task_service::list_catalog(pool).await?;
    let completions = task_service::list_completed_between(pool, week_start, week_end).await?;

    Ok(build_weekly_table(week_start, &tasks, &completions, members))
}

/// Assemble the task x weekday grid and the per-person daily stats.
///
/// Completions outside the week or for tasks missing from `tasks` are
/// ignored. Members are listed first in stats, followed by anyone else who
/// completed something that week, in name order.
pub fn build_weekly_table(
    week_start: NaiveDate,
    tasks: &[Task],
    completions: &[CompletionRecord],
    members: &[String],
) -> WeeklyTable {
    let week_end = get_week_end(week_start);
    let days: Vec<NaiveDate> = (0..7).map(|i| week_start + Duration::days(i)).collect();

    let known_tasks: BTreeSet<i64> = tasks.iter().map(|t| t.id).collect();
    let in_week: Vec<&CompletionRecord> = completions
        .iter()
        .filter(|c| c.completed && c.date >= week_start && c.date <= week_end)
        .filter(|c| known_tasks.contains(&c.task_id))
        .collect();

    let mut by_cell: HashMap<(i64, NaiveDate), Vec<String>> = HashMap::new();
    let mut by_person_day: HashMap<(&str, NaiveDate), i64> = HashMap::new();
    let mut others: BTreeSet<&str> = BTreeSet::new();

    for completion in &in_week {
        let names = by_cell.entry((completion.task_id, completion.date)).or_default();
        if !names.contains(&completion.completed_by) {
            names.push(completion.completed_by.clone());
        }
        *by_person_day
            .entry((completion.completed_by.as_str(), completion.date))
            .or_insert(0) += 1;
        if !members.contains(&completion.completed_by) {
            others.insert(completion.completed_by.as_str());
        }
    }

    let rows = tasks
        .iter()
        .map(|task| WeeklyTaskRow {
            id: task.id,
            name: task.name.clone(),
            avatar_number: task.avatar_number,
            days: days
                .iter()
                .map(|&date| DayCell {
                    date,
                    completed_by: by_cell.get(&(task.id, date)).cloned().unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    let people: Vec<&str> = members
        .iter()
        .map(String::as_str)
        .chain(others.iter().copied())
        .collect();
    let total_tasks = tasks.len() as i64;

    let stats = days
        .iter()
        .map(|&date| DailyStats {
            date,
            total_tasks,
            people: people
                .iter()
                .map(|&name| {
                    let completed = by_person_day.get(&(name, date)).copied().unwrap_or(0);
                    PersonStats {
                        name: name.to_string(),
                        completed,
                        percentage: percentage(completed, total_tasks),
                    }
                })
                .collect(),
        })
        .collect();

    WeeklyTable {
        week_start,
        week_end,
        days,
        tasks: rows,
        stats,
    }
}

fn percentage(completed: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

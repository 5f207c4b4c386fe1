use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::{TaskCompletionRow, TaskRow, TaskViewRow};
use shared::{CompletionRecord, Task, TaskView};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),
    #[error("Task {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Catalog inserted into an empty database: (name, avatar_number, icon)
pub const DEFAULT_CATALOG: &[(&str, i64, &str)] = &[
    ("Diska", 1, "🍽️"),
    ("Dammsuga", 2, "🧹"),
    ("Tvätta", 3, "👕"),
    ("Vika tvätt", 4, "🧺"),
    ("Ta ut soporna", 5, "🗑️"),
    ("Laga mat", 6, "🍳"),
    ("Torka av köksbänken", 7, "🧽"),
    ("Vattna blommorna", 8, "🪴"),
    ("Bädda sängen", 9, "🛏️"),
    ("Mata Beast", 10, "🐾"),
];

/// Get the current date in a specific timezone
pub fn today_in_timezone(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Resolve the date of a request.
///
/// A missing or blank date falls back to `today`. Anything else must be a
/// `YYYY-MM-DD` calendar date.
pub fn resolve_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, TaskError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(today),
        Some(value) => value,
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid_date(raw))?;

    // Signed years and space-padded fields parse, but are not YYYY-MM-DD
    if date.format("%Y-%m-%d").to_string() != raw {
        return Err(invalid_date(raw));
    }

    Ok(date)
}

fn invalid_date(raw: &str) -> TaskError {
    TaskError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

pub async fn insert_task(
    pool: &SqlitePool,
    name: &str,
    avatar_number: i64,
    icon: Option<&str>,
) -> Result<Task, TaskError> {
    let result = sqlx::query("INSERT INTO tasks (name, avatar_number, icon) VALUES (?, ?, ?)")
        .bind(name)
        .bind(avatar_number)
        .bind(icon)
        .execute(pool)
        .await?;

    Ok(Task {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        avatar_number,
        icon: icon.map(String::from),
    })
}

/// Insert the default catalog if there are no tasks yet.
/// Returns the number of tasks inserted.
pub async fn seed_default_catalog(pool: &SqlitePool) -> Result<u64, TaskError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        return Ok(0);
    }

    for &(name, avatar_number, icon) in DEFAULT_CATALOG {
        insert_task(pool, name, avatar_number, Some(icon)).await?;
    }

    Ok(DEFAULT_CATALOG.len() as u64)
}

pub async fn list_catalog(pool: &SqlitePool) -> Result<Vec<Task>, TaskError> {
    let tasks: Vec<TaskRow> = sqlx::query_as("SELECT id, name, avatar_number, icon FROM tasks ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(tasks.into_iter().map(|t| t.to_shared()).collect())
}

/// Delete every task whose name is already used by a task with a lower id.
///
/// Completions recorded against a deleted duplicate are moved to the kept
/// task unless the kept task already has a record for the same date and
/// person. Returns the number of tasks deleted.
pub async fn purge_duplicate_tasks(pool: &SqlitePool) -> Result<u64, TaskError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE OR IGNORE task_completions
        SET task_id = (
            SELECT MIN(keeper.id) FROM tasks keeper
            WHERE keeper.name = (SELECT dup.name FROM tasks dup WHERE dup.id = task_completions.task_id)
        )
        WHERE task_id IN (SELECT id FROM tasks)
          AND task_id NOT IN (SELECT MIN(id) FROM tasks GROUP BY name)
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Whatever could not be moved collides with an existing record
    sqlx::query(
        "DELETE FROM task_completions WHERE task_id NOT IN (SELECT MIN(id) FROM tasks GROUP BY name)",
    )
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM tasks WHERE id NOT IN (SELECT MIN(id) FROM tasks GROUP BY name)")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected())
}

/// Insert or overwrite the completion for (task, date, person).
///
/// The existence check and the write are one statement, so a task deleted
/// concurrently is reported as `NotFound` rather than a constraint failure.
pub async fn upsert_completion(
    pool: &SqlitePool,
    task_id: i64,
    date: NaiveDate,
    completed_by: &str,
    completed: bool,
) -> Result<CompletionRecord, TaskError> {
    let result = sqlx::query(
        r#"
        INSERT INTO task_completions (task_id, date, completed_by, completed, updated_at)
        SELECT ?, ?, ?, ?, strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE EXISTS (SELECT 1 FROM tasks WHERE id = ?)
        ON CONFLICT (task_id, date, completed_by)
        DO UPDATE SET completed = excluded.completed, updated_at = excluded.updated_at
        "#,
    )
    .bind(task_id)
    .bind(date)
    .bind(completed_by)
    .bind(completed)
    .bind(task_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(TaskError::NotFound(task_id));
    }

    Ok(CompletionRecord {
        task_id,
        date,
        completed_by: completed_by.to_string(),
        completed,
    })
}

/// Every task with its completion status for `date`, ordered by id.
///
/// When several people have a record for the same task and date, a completed
/// record wins over an uncompleted one, then the most recently updated.
pub async fn list_tasks_for_date(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<TaskView>, TaskError> {
    let rows: Vec<TaskViewRow> = sqlx::query_as(
        r#"
        SELECT t.id, t.name, t.avatar_number,
               COALESCE(tc.completed, 0) AS completed,
               COALESCE(tc.completed_by, '') AS completed_by
        FROM tasks t
        LEFT JOIN task_completions tc ON tc.id = (
            SELECT c.id FROM task_completions c
            WHERE c.task_id = t.id AND c.date = ?
            ORDER BY c.completed DESC, c.updated_at DESC, c.id DESC
            LIMIT 1
        )
        ORDER BY t.id
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}

/// Completed records between `start` and `end`, both inclusive.
pub async fn list_completed_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CompletionRecord>, TaskError> {
    let rows: Vec<TaskCompletionRow> = sqlx::query_as(
        r#"
        SELECT task_id, date, completed_by, completed
        FROM task_completions
        WHERE completed = 1 AND date >= ? AND date <= ?
        ORDER BY date, task_id, completed_by
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    async fn completion_rows(pool: &SqlitePool) -> Vec<(i64, String, String, bool)> {
        sqlx::query_as(
            "SELECT task_id, date, completed_by, completed FROM task_completions ORDER BY task_id, date, completed_by",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[test]
    fn test_task_error_display() {
        assert_eq!(TaskError::NotFound(7).to_string(), "Task 7 not found");
        assert_eq!(
            TaskError::Validation("bad".to_string()).to_string(),
            "bad"
        );
    }

    #[test]
    fn test_resolve_date_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(resolve_date(None, today).unwrap(), today);
        assert_eq!(resolve_date(Some(""), today).unwrap(), today);
        assert_eq!(resolve_date(Some("  "), today).unwrap(), today);
    }

    #[test]
    fn test_resolve_date_parses_iso_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(resolve_date(Some("2024-05-01"), today).unwrap(), may_first());
    }

    #[test]
    fn test_resolve_date_rejects_malformed() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        for raw in [
            "2024-5-1",
            "01/05/2024",
            "2024-02-30",
            "tomorrow",
            "2024-05-01T00:00",
            "+024-05-01",
            "-024-05-01",
            "2024-1- 01",
            "2024- 1-01",
        ] {
            assert!(
                matches!(resolve_date(Some(raw), today), Err(TaskError::Validation(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[tokio::test]
    async fn test_seed_default_catalog_only_when_empty() {
        let pool = test_pool().await;

        let inserted = seed_default_catalog(&pool).await.unwrap();
        assert_eq!(inserted, DEFAULT_CATALOG.len() as u64);

        let again = seed_default_catalog(&pool).await.unwrap();
        assert_eq!(again, 0);

        let catalog = list_catalog(&pool).await.unwrap();
        assert_eq!(catalog.len(), DEFAULT_CATALOG.len());
        assert_eq!(catalog[0].name, "Diska");
    }

    #[tokio::test]
    async fn test_purge_keeps_lowest_id_per_name() {
        let pool = test_pool().await;
        let diska = insert_task(&pool, "Diska", 1, None).await.unwrap();
        let tvatta = insert_task(&pool, "Tvätta", 3, None).await.unwrap();
        insert_task(&pool, "Diska", 1, None).await.unwrap();
        insert_task(&pool, "Tvätta", 3, None).await.unwrap();
        insert_task(&pool, "Diska", 9, None).await.unwrap();

        let deleted = purge_duplicate_tasks(&pool).await.unwrap();
        assert_eq!(deleted, 3);

        let tasks = list_tasks_for_date(&pool, may_first()).await.unwrap();
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![diska.id, tvatta.id]);
    }

    #[tokio::test]
    async fn test_purge_is_idempotent() {
        let pool = test_pool().await;
        insert_task(&pool, "Diska", 1, None).await.unwrap();
        insert_task(&pool, "Diska", 1, None).await.unwrap();

        assert_eq!(purge_duplicate_tasks(&pool).await.unwrap(), 1);
        assert_eq!(purge_duplicate_tasks(&pool).await.unwrap(), 0);
        assert_eq!(list_catalog(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_moves_completions_to_kept_task() {
        let pool = test_pool().await;
        let keeper = insert_task(&pool, "Diska", 1, None).await.unwrap();
        let duplicate = insert_task(&pool, "Diska", 1, None).await.unwrap();
        let may_second = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        // Collides with the keeper's record and is dropped
        upsert_completion(&pool, keeper.id, may_first(), "Sara", true).await.unwrap();
        upsert_completion(&pool, duplicate.id, may_first(), "Sara", false).await.unwrap();
        // No collision, moved over
        upsert_completion(&pool, duplicate.id, may_second, "Ambjörn", true).await.unwrap();

        purge_duplicate_tasks(&pool).await.unwrap();

        let rows = completion_rows(&pool).await;
        assert_eq!(
            rows,
            vec![
                (keeper.id, "2024-05-01".to_string(), "Sara".to_string(), true),
                (keeper.id, "2024-05-02".to_string(), "Ambjörn".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_tasks_for_date_defaults() {
        let pool = test_pool().await;
        insert_task(&pool, "Diska", 1, None).await.unwrap();

        let tasks = list_tasks_for_date(&pool, may_first()).await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].completed);
        assert_eq!(tasks[0].completed_by, "");
    }

    #[tokio::test]
    async fn test_upsert_then_list() {
        let pool = test_pool().await;
        let diska = insert_task(&pool, "Diska", 1, None).await.unwrap();

        upsert_completion(&pool, diska.id, may_first(), "Sara", true).await.unwrap();

        let tasks = list_tasks_for_date(&pool, may_first()).await.unwrap();
        assert_eq!(
            tasks,
            vec![TaskView {
                id: diska.id,
                name: "Diska".to_string(),
                avatar_number: 1,
                completed: true,
                completed_by: "Sara".to_string(),
            }]
        );

        // Other dates are untouched
        let next_day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let tasks = list_tasks_for_date(&pool, next_day).await.unwrap();
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = test_pool().await;
        let diska = insert_task(&pool, "Diska", 1, None).await.unwrap();

        upsert_completion(&pool, diska.id, may_first(), "Sara", true).await.unwrap();
        let once = completion_rows(&pool).await;
        upsert_completion(&pool, diska.id, may_first(), "Sara", true).await.unwrap();
        let twice = completion_rows(&pool).await;

        assert_eq!(once.len(), 1);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_toggle_round_trip_leaves_other_keys_alone() {
        let pool = test_pool().await;
        let diska = insert_task(&pool, "Diska", 1, None).await.unwrap();
        let tvatta = insert_task(&pool, "Tvätta", 3, None).await.unwrap();
        let may_second = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        upsert_completion(&pool, diska.id, may_first(), "Ambjörn", true).await.unwrap();
        upsert_completion(&pool, tvatta.id, may_first(), "Sara", true).await.unwrap();
        upsert_completion(&pool, diska.id, may_second, "Sara", true).await.unwrap();

        upsert_completion(&pool, diska.id, may_first(), "Sara", true).await.unwrap();
        upsert_completion(&pool, diska.id, may_first(), "Sara", false).await.unwrap();

        let rows = completion_rows(&pool).await;
        assert_eq!(
            rows,
            vec![
                (diska.id, "2024-05-01".to_string(), "Ambjörn".to_string(), true),
                (diska.id, "2024-05-01".to_string(), "Sara".to_string(), false),
                (diska.id, "2024-05-02".to_string(), "Sara".to_string(), true),
                (tvatta.id, "2024-05-01".to_string(), "Sara".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_upsert_unknown_task_is_rejected() {
        let pool = test_pool().await;

        let result = upsert_completion(&pool, 42, may_first(), "Sara", true).await;

        assert!(matches!(result, Err(TaskError::NotFound(42))));
        assert!(completion_rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_on_purged_duplicate_is_not_found() {
        let pool = test_pool().await;
        insert_task(&pool, "Diska", 1, None).await.unwrap();
        let duplicate = insert_task(&pool, "Diska", 1, None).await.unwrap();
        purge_duplicate_tasks(&pool).await.unwrap();

        let result = upsert_completion(&pool, duplicate.id, may_first(), "Sara", true).await;

        assert!(matches!(result, Err(TaskError::NotFound(id)) if id == duplicate.id));
        assert!(completion_rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_overwrite_counts_as_written() {
        let pool = test_pool().await;
        let diska = insert_task(&pool, "Diska", 1, None).await.unwrap();

        upsert_completion(&pool, diska.id, may_first(), "Sara", true).await.unwrap();
        let again = upsert_completion(&pool, diska.id, may_first(), "Sara", false).await;

        assert!(again.is_ok());
        assert_eq!(
            completion_rows(&pool).await,
            vec![(diska.id, "2024-05-01".to_string(), "Sara".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_view_prefers_completed_record() {
        let pool = test_pool().await;
        let diska = insert_task(&pool, "Diska", 1, None).await.unwrap();

        upsert_completion(&pool, diska.id, may_first(), "Sara", true).await.unwrap();
        upsert_completion(&pool, diska.id, may_first(), "Ambjörn", false).await.unwrap();

        let tasks = list_tasks_for_date(&pool, may_first()).await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].completed);
        assert_eq!(tasks[0].completed_by, "Sara");
    }

    #[tokio::test]
    async fn test_list_completed_between() {
        let pool = test_pool().await;
        let diska = insert_task(&pool, "Diska", 1, None).await.unwrap();
        let april_30 = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let may_7 = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();

        upsert_completion(&pool, diska.id, april_30, "Sara", true).await.unwrap();
        upsert_completion(&pool, diska.id, may_first(), "Sara", true).await.unwrap();
        upsert_completion(&pool, diska.id, may_first(), "Ambjörn", false).await.unwrap();
        upsert_completion(&pool, diska.id, may_7, "Ambjörn", true).await.unwrap();

        let records = list_completed_between(&pool, may_first(), may_7).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, may_first());
        assert_eq!(records[0].completed_by, "Sara");
        assert_eq!(records[1].date, may_7);
        assert!(records.iter().all(|r| r.completed));
    }
}

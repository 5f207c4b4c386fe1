use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tokio::time;

use crate::config::Config;
use crate::services::tasks::{self as task_service, TaskError};

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Catalog cleanup failed: {0}")]
    TaskError(#[from] TaskError),
}

/// Report from one maintenance run
#[derive(Debug, Clone)]
pub struct MaintenanceReport {
    pub processed_at: DateTime<Utc>,
    pub duplicates_removed: u64,
}

/// Configuration for the maintenance scheduler
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Hour of day (UTC) to run maintenance (0-23)
    pub run_hour: u32,
    /// Minute of hour to run maintenance (0-59)
    pub run_minute: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            run_hour: 3,
            run_minute: 0,
        }
    }
}

impl From<&Config> for JobConfig {
    fn from(config: &Config) -> Self {
        Self {
            run_hour: config.maintenance_hour,
            run_minute: config.maintenance_minute,
        }
    }
}

/// Next run strictly after `now`: today at the configured time, or tomorrow
/// if that has already passed.
pub fn next_run_after(now: NaiveDateTime, config: &JobConfig) -> NaiveDateTime {
    let today_run = now
        .date()
        .and_hms_opt(config.run_hour, config.run_minute, 0)
        .unwrap_or(now);

    if now < today_run {
        today_run
    } else {
        today_run + Duration::days(1)
    }
}

/// Start the maintenance scheduler.
/// Runs forever, cleaning the catalog once a day.
pub async fn start_scheduler(pool: Arc<SqlitePool>, config: JobConfig) {
    log::info!(
        "Maintenance scheduler started. Catalog cleanup scheduled for {:02}:{:02} UTC",
        config.run_hour,
        config.run_minute
    );

    loop {
        let now = Utc::now().naive_utc();
        let next_run = next_run_after(now, &config);

        let sleep_duration = (next_run - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(3600));

        log::debug!(
            "Next catalog cleanup scheduled in {} seconds",
            sleep_duration.as_secs()
        );

        time::sleep(sleep_duration).await;

        match run_maintenance(&pool).await {
            Ok(report) => {
                log::info!(
                    "Catalog cleanup complete at {}: removed {} duplicate tasks",
                    report.processed_at,
                    report.duplicates_removed
                );
            }
            Err(e) => {
                log::error!("Error during catalog cleanup: {}", e);
            }
        }
    }
}

/// Remove duplicate catalog entries
pub async fn run_maintenance(pool: &SqlitePool) -> Result<MaintenanceReport, MaintenanceError> {
    let duplicates_removed = task_service::purge_duplicate_tasks(pool).await?;

    if duplicates_removed > 0 {
        log::warn!("Removed {} duplicate tasks from the catalog", duplicates_removed);
    }

    Ok(MaintenanceReport {
        processed_at: Utc::now(),
        duplicates_removed,
    })
}

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;
use shared::{ApiError, TaskRequest, TaskView, TasksResponse, WeekQuery};

use crate::models::AppState;
use crate::services::{
    csv_export,
    tasks::{self as task_service, TaskError},
    weekly,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("", web::post().to(post_tasks))
            .route("/week", web::get().to(get_week)),
    );
}

fn error_response(err: &TaskError) -> HttpResponse {
    match err {
        TaskError::Validation(message) => {
            HttpResponse::BadRequest().json(ApiError::new("validation_error", message.clone()))
        }
        TaskError::NotFound(_) => HttpResponse::NotFound().json(ApiError::new("not_found", err.to_string())),
        TaskError::DatabaseError(e) => {
            log::error!("Task store error: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ApiError::new("store_unavailable", "Task store unavailable"))
        }
    }
}

/// Validate the request, apply the optional completion write and read the
/// day's task list.
async fn process_request(
    state: &AppState,
    request: &TaskRequest,
) -> Result<(NaiveDate, Vec<TaskView>), TaskError> {
    let today = task_service::today_in_timezone(state.config.timezone);
    let date = task_service::resolve_date(request.date.as_deref(), today)?;

    let completed_by = request
        .completed_by
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    if let (Some(task_id), Some(completed_by)) = (request.task_id, completed_by) {
        let completed = request.completed.ok_or_else(|| {
            TaskError::Validation("'completed' is required when marking a task".to_string())
        })?;

        let record = task_service::upsert_completion(&state.db, task_id, date, completed_by, completed).await?;
        log::info!(
            "Task {} on {} set to {} by {}",
            record.task_id,
            record.date,
            record.completed,
            record.completed_by
        );
    }

    let tasks = task_service::list_tasks_for_date(&state.db, date).await?;

    Ok((date, tasks))
}

async fn post_tasks(state: web::Data<AppState>, body: web::Json<TaskRequest>) -> Result<HttpResponse> {
    let request = body.into_inner();

    let (date, tasks) = match process_request(&state, &request).await {
        Ok(result) => result,
        Err(e) => return Ok(error_response(&e)),
    };

    if request.export_csv {
        return Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(csv_export::csv_filename(date))],
            })
            .body(csv_export::render_csv(&tasks)));
    }

    Ok(HttpResponse::Ok().json(TasksResponse { tasks }))
}

async fn get_week(state: web::Data<AppState>, query: web::Query<WeekQuery>) -> Result<HttpResponse> {
    let today = task_service::today_in_timezone(state.config.timezone);
    let date = match task_service::resolve_date(query.date.as_deref(), today) {
        Ok(d) => d,
        Err(e) => return Ok(error_response(&e)),
    };

    match weekly::get_weekly_table(&state.db, date, &state.config.members).await {
        Ok(table) => Ok(HttpResponse::Ok().json(table)),
        Err(e) => Ok(error_response(&e)),
    }
}

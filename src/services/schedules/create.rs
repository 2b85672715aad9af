use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ScheduleService;
use crate::models::{ApiResponse, ErrorCode, schedules::requests::CreateScheduleRequest};
use crate::services::{internal_error, require_context};
use crate::utils::validate::{validate_time_range, validate_title};

pub async fn create_schedule(
    service: &ScheduleService,
    batch_id: i64,
    mut schedule: CreateScheduleRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_title(&schedule.title) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    if let Err(msg) = validate_time_range(schedule.start_time, schedule.end_time) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidScheduleTime, msg)));
    }
    schedule.title = schedule.title.trim().to_string();

    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    match storage.create_schedule(batch_id, schedule, ctx.user_id).await {
        Ok(schedule) => {
            tracing::info!("Schedule {} created in batch {}", schedule.id, batch_id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(schedule, "Schedule created successfully")))
        }
        Err(e) => Ok(internal_error("Create schedule", &e)),
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ScheduleService, load_managed_schedule};
use crate::models::{ApiResponse, ErrorCode, schedules::requests::UpdateScheduleRequest};
use crate::services::{internal_error, require_context};
use crate::utils::validate::{validate_time_range, validate_title};

pub async fn update_schedule(
    service: &ScheduleService,
    schedule_id: i64,
    mut update: UpdateScheduleRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(title) = update.title.as_mut() {
        if let Err(msg) = validate_title(title) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
        }
        *title = title.trim().to_string();
    }

    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let (current, _) = match load_managed_schedule(&storage, &ctx, schedule_id).await {
        Ok(found) => found,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let start = update.start_time.unwrap_or(current.start_time);
    let end = update.end_time.unwrap_or(current.end_time);
    if let Err(msg) = validate_time_range(start, end) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidScheduleTime, msg)));
    }

    match storage.update_schedule(schedule_id, update).await {
        Ok(Some(schedule)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            schedule,
            "Schedule updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ScheduleNotFound,
            "Schedule not found",
        ))),
        Err(e) => Ok(internal_error("Update schedule", &e)),
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ScheduleService, load_managed_schedule};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{internal_error, require_context};

pub async fn delete_schedule(
    service: &ScheduleService,
    schedule_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    if let Err(rejection) = load_managed_schedule(&storage, &ctx, schedule_id).await {
        return Ok(rejection.into_response());
    }

    // 出勤记录随课表级联删除
    match storage.delete_schedule(schedule_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Schedule deleted successfully",
        ))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ScheduleNotFound,
            "Schedule not found",
        ))),
        Err(e) => Ok(internal_error("Delete schedule", &e)),
    }
}

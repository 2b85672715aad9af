use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AttendanceService;
use crate::models::{ApiResponse, attendance::responses::AttendanceListResponse};
use crate::services::schedules::load_managed_schedule;
use crate::services::{internal_error, require_context};

pub async fn list_attendance(
    service: &AttendanceService,
    schedule_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    if let Err(rejection) = load_managed_schedule(&storage, &ctx, schedule_id).await {
        return Ok(rejection.into_response());
    }

    match storage.list_schedule_attendance(schedule_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AttendanceListResponse { schedule_id, items },
            "Attendance retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("List attendance", &e)),
    }
}

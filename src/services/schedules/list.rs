use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ScheduleService;
use crate::models::{ApiResponse, schedules::responses::ScheduleListResponse};
use crate::services::internal_error;

pub async fn list_schedules(
    service: &ScheduleService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_batch_schedules(batch_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ScheduleListResponse { batch_id, items },
            "Schedules retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("List schedules", &e)),
    }
}

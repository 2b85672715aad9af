use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FeedbackService;
use crate::models::feedback::{requests::FeedbackQueryParams, responses::FeedbackListResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;

pub async fn list_feedback(
    service: &FeedbackService,
    batch_id: i64,
    query: FeedbackQueryParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if query.interval.is_some_and(|interval| interval < 1) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::FeedbackIntervalInvalid,
            "Interval must be positive",
        )));
    }

    let storage = service.get_storage(request)?;

    match storage.list_batch_feedback(batch_id, query.interval).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            FeedbackListResponse { batch_id, items },
            "Feedback retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("List feedback", &e)),
    }
}

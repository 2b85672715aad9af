use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FeedbackService;
use crate::domain::feedback_gate;
use crate::models::ApiResponse;
use crate::services::{internal_error, require_context};

pub async fn get_requirement(
    service: &FeedbackService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let resource_count = match storage.count_batch_resources(batch_id).await {
        Ok(count) => count,
        Err(e) => return Ok(internal_error("Count resources", &e)),
    };
    let submitted = match storage.list_submitted_intervals(batch_id, ctx.user_id).await {
        Ok(submitted) => submitted,
        Err(e) => return Ok(internal_error("Load submitted feedback", &e)),
    };

    let requirement = feedback_gate::evaluate_requirement(resource_count, &submitted);
    tracing::debug!(
        "Feedback requirement for student {} in batch {}: {:?}",
        ctx.user_id,
        batch_id,
        requirement
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        requirement,
        "Feedback requirement retrieved successfully",
    )))
}

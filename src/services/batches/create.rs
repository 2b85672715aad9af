use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{BatchService, check_date_range, check_instructor};
use crate::models::{ApiResponse, ErrorCode, batches::requests::CreateBatchRequest};
use crate::services::internal_error;
use crate::utils::validate::validate_title;

pub async fn create_batch(
    service: &BatchService,
    mut batch: CreateBatchRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_title(&batch.name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    if let Err(msg) = check_date_range(batch.start_date, batch.end_date) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    batch.name = batch.name.trim().to_string();

    let storage = service.get_storage(request)?;

    match storage.get_course_by_id(batch.course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::CourseNotFound,
                "Course not found",
            )));
        }
        Err(e) => return Ok(internal_error("Create batch", &e)),
    }
    if let Err(response) = check_instructor(&storage, batch.instructor_id).await {
        return Ok(response);
    }

    match storage.create_batch(batch).await {
        Ok(batch) => {
            tracing::info!("Batch {} created for course {}", batch.id, batch.course_id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(batch, "Batch created successfully")))
        }
        Err(e) => Ok(internal_error("Create batch", &e)),
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{BatchService, check_date_range, check_instructor};
use crate::models::{ApiResponse, ErrorCode, batches::requests::UpdateBatchRequest};
use crate::services::internal_error;
use crate::utils::validate::validate_title;

pub async fn update_batch(
    service: &BatchService,
    batch_id: i64,
    mut update: UpdateBatchRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(name) = update.name.as_mut() {
        if let Err(msg) = validate_title(name) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
        }
        *name = name.trim().to_string();
    }

    let storage = service.get_storage(request)?;

    let current = match storage.get_batch_by_id(batch_id).await {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::BatchNotFound,
                "Batch not found",
            )));
        }
        Err(e) => return Ok(internal_error("Update batch", &e)),
    };

    // 与未修改的一端组合后再校验日期
    let start = update.start_date.or(current.start_date);
    let end = update.end_date.or(current.end_date);
    if let Err(msg) = check_date_range(start, end) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    if let Some(instructor_id) = update.instructor_id
        && instructor_id != current.instructor_id
        && let Err(response) = check_instructor(&storage, instructor_id).await
    {
        return Ok(response);
    }

    match storage.update_batch(batch_id, update).await {
        Ok(Some(batch)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            batch,
            "Batch updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(internal_error("Update batch", &e)),
    }
}

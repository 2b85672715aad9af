use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireBatchAccess;
use crate::models::{ApiResponse, ErrorCode};

// 班次已由 RequireBatchAccess 加载并校验
pub async fn get_batch(request: &HttpRequest) -> ActixResult<HttpResponse> {
    match RequireBatchAccess::extract_batch(request) {
        Some(batch) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            batch,
            "Batch retrieved successfully",
        ))),
        None => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
    }
}

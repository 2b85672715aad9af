use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::BatchService;
use crate::models::users::entities::UserRole;
use crate::models::{
    ApiResponse, ErrorCode,
    batches::{
        requests::AddStudentsRequest,
        responses::{AddStudentsResponse, BatchStudentsResponse},
    },
};
use crate::services::internal_error;

pub async fn list_students(
    service: &BatchService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_batch_students(batch_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            BatchStudentsResponse { batch_id, items },
            "Batch students retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("List batch students", &e)),
    }
}

/// 批量加入学员
///
/// 非学员或不存在的用户进入 `rejected`，已在班次中的进入 `already_enrolled`。
pub async fn add_students(
    service: &BatchService,
    batch_id: i64,
    body: AddStudentsRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if body.student_ids.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            "student_ids must not be empty",
        )));
    }

    let storage = service.get_storage(request)?;
    let mut response = AddStudentsResponse {
        added: Vec::new(),
        already_enrolled: Vec::new(),
        rejected: Vec::new(),
    };

    let mut ids = body.student_ids;
    ids.sort_unstable();
    ids.dedup();

    for student_id in ids {
        match storage.get_user_by_id(student_id).await {
            Ok(Some(user)) if user.role == UserRole::Student => {}
            Ok(_) => {
                response.rejected.push(student_id);
                continue;
            }
            Err(e) => return Ok(internal_error("Add students", &e)),
        }

        match storage.enroll_student(batch_id, student_id).await {
            Ok(true) => response.added.push(student_id),
            Ok(false) => response.already_enrolled.push(student_id),
            Err(e) => return Ok(internal_error("Add students", &e)),
        }
    }

    tracing::info!(
        "Batch {}: {} students added, {} rejected",
        batch_id,
        response.added.len(),
        response.rejected.len()
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Students processed")))
}

pub async fn remove_student(
    service: &BatchService,
    batch_id: i64,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.remove_student(batch_id, student_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Student removed from batch",
        ))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotEnrolled,
            "Student is not enrolled in this batch",
        ))),
        Err(e) => Ok(internal_error("Remove student", &e)),
    }
}

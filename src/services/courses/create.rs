use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::{ApiResponse, ErrorCode, courses::requests::CreateCourseRequest};
use crate::services::{internal_error, require_context};
use crate::utils::validate::validate_title;

pub async fn create_course(
    service: &CourseService,
    mut course: CreateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_title(&course.title) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    course.title = course.title.trim().to_string();

    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    match storage.create_course(course, ctx.user_id).await {
        Ok(course) => {
            tracing::info!("Course {} created by {}", course.id, ctx.user_id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(course, "Course created successfully")))
        }
        Err(e) => Ok(internal_error("Create course", &e)),
    }
}

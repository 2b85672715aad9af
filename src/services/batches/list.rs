use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::BatchService;
use crate::models::users::entities::UserRole;
use crate::models::{
    ApiResponse,
    batches::requests::{BatchListQuery, BatchQueryParams},
};
use crate::services::{internal_error, require_context};

pub async fn list_batches(
    service: &BatchService,
    query: BatchQueryParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let mut list_query = BatchListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        course_id: query.course_id,
        status: query.status,
        search: query.search,
        ..Default::default()
    };
    // 讲师只看自己授课的班次，学员只看已加入的班次
    match ctx.role {
        UserRole::Admin => {}
        UserRole::Instructor => list_query.instructor_id = Some(ctx.user_id),
        UserRole::Student => list_query.student_id = Some(ctx.user_id),
    }

    match storage.list_batches_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Batch list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("List batches", &e)),
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::{ApiResponse, ErrorCode, batches::requests::BatchListQuery};
use crate::services::internal_error;
use crate::services::resources::remove_stored_files;

pub async fn delete_course(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    // 班次及其资源随课程级联删除，先记下需要清理的文件
    let mut stored = Vec::new();
    let mut page = 1;
    loop {
        let batches = match storage
            .list_batches_with_pagination(BatchListQuery {
                page: Some(page),
                size: Some(100),
                course_id: Some(course_id),
                ..Default::default()
            })
            .await
        {
            Ok(batches) => batches,
            Err(e) => return Ok(internal_error("Delete course", &e)),
        };
        for batch in &batches.items {
            match storage.list_batch_resources(batch.id).await {
                Ok(resources) => stored.extend(resources),
                Err(e) => return Ok(internal_error("Delete course", &e)),
            }
        }
        if page >= batches.pagination.total_pages {
            break;
        }
        page += 1;
    }

    match storage.delete_course(course_id).await {
        Ok(true) => {
            remove_stored_files(&stored).await;
            tracing::info!("Course {} deleted with {} files", course_id, stored.len());
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Course deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseNotFound,
            "Course not found",
        ))),
        Err(e) => Ok(internal_error("Delete course", &e)),
    }
}

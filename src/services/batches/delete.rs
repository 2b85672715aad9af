use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::BatchService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::services::resources::remove_stored_files;

pub async fn delete_batch(
    service: &BatchService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    // 资源记录随班次级联删除，文件需另行清理
    let resources = match storage.list_batch_resources(batch_id).await {
        Ok(resources) => resources,
        Err(e) => return Ok(internal_error("Delete batch", &e)),
    };

    match storage.delete_batch(batch_id).await {
        Ok(true) => {
            remove_stored_files(&resources).await;
            tracing::info!("Batch {} deleted", batch_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Batch deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(internal_error("Delete batch", &e)),
    }
}

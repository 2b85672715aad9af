use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ResourceService, remove_stored_files};
use crate::domain::access;
use crate::models::resources::{
    requests::BulkDeleteResourcesRequest, responses::DeleteResourcesResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, internal_error, require_context};
use crate::storage::{ResourceDeletion, Storage};
use std::sync::Arc;

// 数据库事务提交后再删除文件
async fn delete_and_cleanup(
    storage: &Arc<dyn Storage>,
    batch_id: i64,
    resource_ids: &[i64],
) -> HttpResponse {
    let ResourceDeletion {
        deleted,
        pruned_feedback,
    } = match storage.delete_resources(batch_id, resource_ids).await {
        Ok(result) => result,
        Err(e) => return internal_error("Delete resources", &e),
    };

    remove_stored_files(&deleted).await;
    tracing::info!(
        "Batch {}: deleted {} resources, pruned {} feedback rows",
        batch_id,
        deleted.len(),
        pruned_feedback
    );

    HttpResponse::Ok().json(ApiResponse::success(
        DeleteResourcesResponse {
            deleted_ids: deleted.iter().map(|r| r.id).collect(),
            pruned_feedback,
        },
        "Resources deleted successfully",
    ))
}

pub async fn delete_resource(
    service: &ResourceService,
    resource_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let resource = match storage.get_resource_by_id(resource_id).await {
        Ok(Some(resource)) => resource,
        Ok(None) => {
            return Ok(
                Rejection::not_found(ErrorCode::ResourceNotFound, "Resource not found")
                    .into_response(),
            );
        }
        Err(e) => return Ok(internal_error("Load resource", &e)),
    };

    let batch = match storage.get_batch_by_id(resource.batch_id).await {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            return Ok(
                Rejection::not_found(ErrorCode::BatchNotFound, "Batch not found").into_response(),
            );
        }
        Err(e) => return Ok(internal_error("Load batch", &e)),
    };
    if !access::can_manage_batch(&ctx, &batch) {
        return Ok(Rejection::forbidden(
            ErrorCode::BatchPermissionDenied,
            "No permission for this batch",
        )
        .into_response());
    }

    Ok(delete_and_cleanup(&storage, batch.id, &[resource.id]).await)
}

/// 批量删除，不属于该班次的 ID 被忽略
pub async fn bulk_delete_resources(
    service: &ResourceService,
    batch_id: i64,
    body: BulkDeleteResourcesRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if body.resource_ids.is_empty() {
        return Ok(Rejection::bad_request(
            ErrorCode::ValidationFailed,
            "resource_ids must not be empty",
        )
        .into_response());
    }

    let storage = service.get_storage(request)?;
    Ok(delete_and_cleanup(&storage, batch_id, &body.resource_ids).await)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use crate::models::RequestContext;
    use crate::models::feedback::requests::SubmitFeedbackRequest;
    use crate::models::users::entities::UserRole;
    use actix_web::http::StatusCode;

    async fn give_feedback(storage: &Arc<dyn Storage>, batch_id: i64, student_id: i64, intervals: &[i64]) {
        for &interval in intervals {
            storage
                .upsert_feedback(
                    batch_id,
                    student_id,
                    SubmitFeedbackRequest {
                        interval,
                        rating: 3,
                        feedback: None,
                    },
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_deleting_everything_prunes_all_feedback() {
        let fixture = fixtures::setup(7).await;
        give_feedback(&fixture.storage, fixture.batch_id, fixture.student_id, &[1, 2]).await;
        let req = fixtures::request(
            &fixture.storage,
            RequestContext::new(fixture.instructor_id, UserRole::Instructor),
        );

        let ids: Vec<i64> = fixture.resources.iter().map(|r| r.id).collect();
        let response = bulk_delete_resources(
            &ResourceService::new_lazy(),
            fixture.batch_id,
            BulkDeleteResourcesRequest {
                resource_ids: ids.clone(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = fixtures::body_json(response).await;
        assert_eq!(json["data"]["deleted_ids"].as_array().unwrap().len(), 7);
        assert_eq!(json["data"]["pruned_feedback"], 2);

        assert!(
            fixture
                .storage
                .list_batch_feedback(fixture.batch_id, None)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            fixture
                .storage
                .list_batch_resources(fixture.batch_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_single_delete_keeps_feedback_in_range() {
        let fixture = fixtures::setup(7).await;
        give_feedback(&fixture.storage, fixture.batch_id, fixture.student_id, &[1, 2]).await;
        let req = fixtures::request(&fixture.storage, RequestContext::new(1, UserRole::Admin));

        // 7 -> 6 份资源，区间数仍为 2
        let response = delete_resource(&ResourceService::new_lazy(), fixture.resources[6].id, &req)
            .await
            .unwrap();
        let json = fixtures::body_json(response).await;
        assert_eq!(json["data"]["pruned_feedback"], 0);
        assert_eq!(
            fixture
                .storage
                .list_batch_feedback(fixture.batch_id, None)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_delete_permissions_and_validation() {
        let fixture = fixtures::setup(2).await;
        let service = ResourceService::new_lazy();

        let other = RequestContext::new(4242, UserRole::Instructor);
        let req = fixtures::request(&fixture.storage, other);
        let response = delete_resource(&service, fixture.resources[0].id, &req)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = delete_resource(&service, 9999, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = bulk_delete_resources(
            &service,
            fixture.batch_id,
            BulkDeleteResourcesRequest {
                resource_ids: Vec::new(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

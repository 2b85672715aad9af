use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use std::path::Path;

use super::{ResourceService, stored_path, unlocked_through_for};
use crate::domain::{access, feedback_gate};
use crate::errors::LmsError;
use crate::models::{ErrorCode, RequestContext};
use crate::models::resources::entities::Resource;
use crate::services::{Rejection, require_context};
use crate::storage::Storage;
use crate::utils::content_type_for;
use std::sync::Arc;

// 教职人员需能管理该班次；学员需已加入且资源所在区间已解锁
async fn check_download(
    storage: &Arc<dyn Storage>,
    ctx: &RequestContext,
    resource: &Resource,
) -> Result<(), Rejection> {
    let batch = storage
        .get_batch_by_id(resource.batch_id)
        .await
        .map_err(|e| Rejection::internal("Load batch", &e))?
        .ok_or_else(|| Rejection::not_found(ErrorCode::BatchNotFound, "Batch not found"))?;

    if access::can_manage_batch(ctx, &batch) {
        return Ok(());
    }

    let enrolled = ctx.is_student()
        && storage
            .is_student_enrolled(batch.id, ctx.user_id)
            .await
            .map_err(|e| Rejection::internal("Check enrolment", &e))?;
    if !enrolled {
        return Err(Rejection::forbidden(
            ErrorCode::BatchPermissionDenied,
            "No permission for this batch",
        ));
    }

    let resources = storage
        .list_batch_resources(batch.id)
        .await
        .map_err(|e| Rejection::internal("List resources", &e))?;
    let unlocked = unlocked_through_for(storage, ctx, batch.id).await?;

    let locked = feedback_gate::sequence_resources(resources, unlocked)
        .into_iter()
        .find(|item| item.resource.id == resource.id)
        .is_some_and(|item| item.locked);
    if locked {
        return Err(Rejection::forbidden(
            ErrorCode::ResourceLocked,
            "Submit feedback for earlier intervals to unlock this resource",
        ));
    }

    Ok(())
}

pub async fn handle_download(
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
        Err(e) => return Ok(Rejection::internal("Load resource", &e).into_response()),
    };

    if let Err(rejection) = check_download(&storage, &ctx, &resource).await {
        return Ok(rejection.into_response());
    }

    let path = stored_path(&resource.stored_name);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Resource {} file missing at {}", resource.id, path.display());
            return Ok(
                Rejection::not_found(ErrorCode::FileNotFound, "File not found").into_response(),
            );
        }
        Err(e) => {
            return Ok(
                Rejection::internal("Read file", &LmsError::from(e)).into_response(),
            );
        }
    };

    let extension = Path::new(&resource.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_for(&extension)))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                resource.file_name.replace('"', "")
            ),
        ))
        .body(data))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{self, Fixture};
    use super::*;
    use crate::models::feedback::requests::SubmitFeedbackRequest;
    use crate::models::users::entities::UserRole;
    use actix_web::http::StatusCode;

    async fn download_as(fixture: &Fixture, ctx: RequestContext, resource_id: i64) -> HttpResponse {
        let req = fixtures::request(&fixture.storage, ctx);
        handle_download(&ResourceService::new_lazy(), resource_id, &req)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_interval_locked_until_feedback() {
        let fixture = fixtures::setup(6).await;
        let sixth = &fixture.resources[5];
        fixtures::write_file(sixth, b"hello").await;
        let student = RequestContext::new(fixture.student_id, UserRole::Student);

        let response = download_as(&fixture, student.clone(), sixth.id).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = fixtures::body_json(response).await;
        assert_eq!(json["code"], ErrorCode::ResourceLocked as i32);

        // 第一区间始终可下载
        fixtures::write_file(&fixture.resources[0], b"intro").await;
        let response = download_as(&fixture, student.clone(), fixture.resources[0].id).await;
        assert_eq!(response.status(), StatusCode::OK);

        fixture
            .storage
            .upsert_feedback(
                fixture.batch_id,
                fixture.student_id,
                SubmitFeedbackRequest {
                    interval: 1,
                    rating: 4,
                    feedback: None,
                },
            )
            .await
            .unwrap();

        let response = download_as(&fixture, student, sixth.id).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("lecture-5.txt"));
        let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&bytes[..], b"hello");

        for resource in [&fixture.resources[0], sixth] {
            let _ = tokio::fs::remove_file(stored_path(&resource.stored_name)).await;
        }
    }

    #[tokio::test]
    async fn test_staff_bypass_and_outsider_denied() {
        let fixture = fixtures::setup(6).await;
        let sixth = &fixture.resources[5];
        fixtures::write_file(sixth, b"slides").await;

        let instructor = RequestContext::new(fixture.instructor_id, UserRole::Instructor);
        let response = download_as(&fixture, instructor, sixth.id).await;
        assert_eq!(response.status(), StatusCode::OK);

        let outsider = RequestContext::new(fixture.outsider_id, UserRole::Student);
        let response = download_as(&fixture, outsider, fixture.resources[0].id).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin = RequestContext::new(1, UserRole::Admin);
        let response = download_as(&fixture, admin, 9999).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let _ = tokio::fs::remove_file(stored_path(&sixth.stored_name)).await;
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let fixture = fixtures::setup(1).await;
        let admin = RequestContext::new(1, UserRole::Admin);
        let response = download_as(&fixture, admin, fixture.resources[0].id).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = fixtures::body_json(response).await;
        assert_eq!(json["code"], ErrorCode::FileNotFound as i32);
    }
}

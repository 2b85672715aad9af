use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FeedbackService;
use crate::domain::feedback_gate::{self, SubmissionRejection};
use crate::models::feedback::{requests::SubmitFeedbackRequest, responses::SubmitFeedbackResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{internal_error, require_context};
use crate::utils::validate::validate_rating;

/// 提交或覆盖某区间的反馈
///
/// 区间必须在 `1..=interval_count` 内，且更早的区间都已提交。
pub async fn submit_feedback(
    service: &FeedbackService,
    batch_id: i64,
    mut body: SubmitFeedbackRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_rating(body.rating) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    body.feedback = body
        .feedback
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let resource_count = match storage.count_batch_resources(batch_id).await {
        Ok(count) => count,
        Err(e) => return Ok(internal_error("Count resources", &e)),
    };
    let submitted = match storage.list_submitted_intervals(batch_id, ctx.user_id).await {
        Ok(submitted) => submitted,
        Err(e) => return Ok(internal_error("Load submitted feedback", &e)),
    };

    match feedback_gate::check_submission(body.interval, resource_count, &submitted) {
        Ok(()) => {}
        Err(SubmissionRejection::OutOfRange { max }) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FeedbackIntervalInvalid,
                format!("Interval must be between 1 and {max}"),
            )));
        }
        Err(SubmissionRejection::OutOfOrder { missing }) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FeedbackOutOfOrder,
                format!("Feedback for interval {missing} must be submitted first"),
            )));
        }
    }

    match storage.upsert_feedback(batch_id, ctx.user_id, body).await {
        Ok((feedback, created)) => {
            tracing::info!(
                "Student {} {} feedback for interval {} in batch {}",
                ctx.user_id,
                if created { "submitted" } else { "updated" },
                feedback.interval,
                batch_id
            );
            let response = if created {
                HttpResponse::Created()
            } else {
                HttpResponse::Ok()
            }
            .json(ApiResponse::success(
                SubmitFeedbackResponse { feedback, created },
                "Feedback saved successfully",
            ));
            Ok(response)
        }
        Err(e) => Ok(internal_error("Save feedback", &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestContext;
    use crate::models::resources::{entities::ResourceType, requests::CreateResourceRequest};
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, test_support};
    use actix_web::{HttpMessage, http::StatusCode, test::TestRequest, web};
    use std::sync::Arc;

    async fn setup(resources: usize) -> (Arc<dyn Storage>, i64, i64) {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "alice", UserRole::Student).await;
        storage.enroll_student_impl(batch.id, student.id).await.unwrap();
        for i in 0..resources {
            storage
                .create_resource_impl(CreateResourceRequest {
                    batch_id: batch.id,
                    title: format!("资料 {i}"),
                    resource_type: ResourceType::Assignment,
                    file_name: format!("r{i}.pdf"),
                    stored_name: format!("r{i}.pdf"),
                    file_size: 10,
                    content_type: "application/pdf".to_string(),
                    uploaded_by: instructor.id,
                })
                .await
                .unwrap();
        }
        (Arc::new(storage), batch.id, student.id)
    }

    fn request(storage: &Arc<dyn Storage>, student_id: i64) -> HttpRequest {
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        req.extensions_mut()
            .insert(RequestContext::new(student_id, UserRole::Student));
        req
    }

    fn body(interval: i64, rating: i32) -> SubmitFeedbackRequest {
        SubmitFeedbackRequest {
            interval,
            rating,
            feedback: Some("  讲得很清楚  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_in_order_then_overwrite() {
        let (storage, batch_id, student_id) = setup(11).await;
        let service = FeedbackService::new_lazy();
        let req = request(&storage, student_id);

        let response = submit_feedback(&service, batch_id, body(2, 4), &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = submit_feedback(&service, batch_id, body(1, 4), &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = submit_feedback(&service, batch_id, body(1, 5), &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let rows = storage.list_batch_feedback(batch_id, Some(1)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rating, 5);
        assert_eq!(rows[0].feedback.as_deref(), Some("讲得很清楚"));
    }

    #[tokio::test]
    async fn test_submit_rejects_out_of_range_and_bad_rating() {
        let (storage, batch_id, student_id) = setup(6).await;
        let service = FeedbackService::new_lazy();
        let req = request(&storage, student_id);

        let response = submit_feedback(&service, batch_id, body(3, 4), &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = submit_feedback(&service, batch_id, body(1, 0), &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = submit_feedback(&service, batch_id, body(0, 3), &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ResourceService, unlocked_through_for};
use crate::domain::feedback_gate;
use crate::models::{ApiResponse, resources::responses::ResourceListResponse};
use crate::services::{internal_error, require_context};

/// 列出班次资源，附带序号、区间与锁定状态
pub async fn list_resources(
    service: &ResourceService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let resources = match storage.list_batch_resources(batch_id).await {
        Ok(resources) => resources,
        Err(e) => return Ok(internal_error("List resources", &e)),
    };
    let unlocked_through = match unlocked_through_for(&storage, &ctx, batch_id).await {
        Ok(unlocked) => unlocked,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let total = resources.len() as i64;
    let response = ResourceListResponse {
        batch_id,
        total,
        interval_count: feedback_gate::interval_count(total),
        unlocked_through,
        items: feedback_gate::sequence_resources(resources, unlocked_through),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Resources retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use crate::models::RequestContext;
    use crate::models::feedback::requests::SubmitFeedbackRequest;
    use crate::models::users::entities::UserRole;
    use actix_web::http::StatusCode;

    fn locked_flags(json: &serde_json::Value) -> Vec<bool> {
        json["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["locked"].as_bool().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_student_sees_locked_second_interval() {
        let fixture = fixtures::setup(7).await;
        let service = ResourceService::new_lazy();
        let req = fixtures::request(
            &fixture.storage,
            RequestContext::new(fixture.student_id, UserRole::Student),
        );

        let response = list_resources(&service, fixture.batch_id, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = fixtures::body_json(response).await;
        assert_eq!(json["data"]["interval_count"], 2);
        assert_eq!(json["data"]["unlocked_through"], 1);
        assert_eq!(
            locked_flags(&json),
            vec![false, false, false, false, false, true, true]
        );
        assert_eq!(json["data"]["items"][5]["index"], 5);
        assert_eq!(json["data"]["items"][5]["interval"], 2);

        fixture
            .storage
            .upsert_feedback(
                fixture.batch_id,
                fixture.student_id,
                SubmitFeedbackRequest {
                    interval: 1,
                    rating: 5,
                    feedback: None,
                },
            )
            .await
            .unwrap();
        let response = list_resources(&service, fixture.batch_id, &req).await.unwrap();
        let json = fixtures::body_json(response).await;
        assert!(locked_flags(&json).iter().all(|locked| !locked));
    }

    #[tokio::test]
    async fn test_staff_see_everything_unlocked() {
        let fixture = fixtures::setup(7).await;
        let service = ResourceService::new_lazy();

        for ctx in [
            RequestContext::new(fixture.instructor_id, UserRole::Instructor),
            RequestContext::new(1, UserRole::Admin),
        ] {
            let req = fixtures::request(&fixture.storage, ctx);
            let response = list_resources(&service, fixture.batch_id, &req).await.unwrap();
            let json = fixtures::body_json(response).await;
            assert!(json["data"]["unlocked_through"].is_null());
            assert_eq!(locked_flags(&json).len(), 7);
            assert!(locked_flags(&json).iter().all(|locked| !locked));
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let fixture = fixtures::setup(0).await;
        let req = fixtures::request(
            &fixture.storage,
            RequestContext::new(fixture.student_id, UserRole::Student),
        );
        let response = list_resources(&ResourceService::new_lazy(), fixture.batch_id, &req)
            .await
            .unwrap();
        let json = fixtures::body_json(response).await;
        assert_eq!(json["data"]["total"], 0);
        assert_eq!(json["data"]["interval_count"], 0);
        assert!(json["data"]["items"].as_array().unwrap().is_empty());
    }
}

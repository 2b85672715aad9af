use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireBatchAccess, RequireRole};
use crate::models::feedback::requests::{FeedbackQueryParams, SubmitFeedbackRequest};
use crate::models::users::entities::UserRole;
use crate::services::FeedbackService;
use crate::utils::SafeBatchIdI64;

static FEEDBACK_SERVICE: Lazy<FeedbackService> = Lazy::new(FeedbackService::new_lazy);

pub async fn get_requirement(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE.get_requirement(batch_id.0, &req).await
}

pub async fn submit_feedback(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    body: web::Json<SubmitFeedbackRequest>,
) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE
        .submit_feedback(batch_id.0, body.into_inner(), &req)
        .await
}

pub async fn list_feedback(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    query: web::Query<FeedbackQueryParams>,
) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE
        .list_feedback(batch_id.0, query.into_inner(), &req)
        .await
}

/// `/api/v1/batches/{batch_id}/feedback`，在班次 scope 内注册
///
/// 提交与查询需求仅限已加入的学员，查看全部反馈仅限班次讲师与管理员。
pub fn configure_batch_feedback_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{batch_id}/feedback/required").route(
            web::get()
                .to(get_requirement)
                .wrap(RequireBatchAccess::member())
                .wrap(RequireRole::new_any(UserRole::student_roles())),
        ),
    )
    .service(
        web::resource("/{batch_id}/feedback")
            .route(
                web::get()
                    .to(list_feedback)
                    .wrap(RequireBatchAccess::staff()),
            )
            .route(
                web::post()
                    .to(submit_feedback)
                    .wrap(RequireBatchAccess::member())
                    .wrap(RequireRole::new_any(UserRole::student_roles())),
            ),
    );
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireBatchAccess, RequireRole};
use crate::models::batches::requests::{
    AddStudentsRequest, BatchQueryParams, CreateBatchRequest, UpdateBatchRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::BatchService;
use crate::utils::{SafeBatchIdI64, SafeStudentIdI64};

use super::{feedback, resources, schedules};

static BATCH_SERVICE: Lazy<BatchService> = Lazy::new(BatchService::new_lazy);

pub async fn list_batches(
    req: HttpRequest,
    query: web::Query<BatchQueryParams>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.list_batches(query.into_inner(), &req).await
}

pub async fn get_batch(req: HttpRequest) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.get_batch(&req).await
}

pub async fn create_batch(
    req: HttpRequest,
    batch: web::Json<CreateBatchRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.create_batch(batch.into_inner(), &req).await
}

pub async fn update_batch(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    update: web::Json<UpdateBatchRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE
        .update_batch(batch_id.0, update.into_inner(), &req)
        .await
}

pub async fn delete_batch(req: HttpRequest, batch_id: SafeBatchIdI64) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.delete_batch(batch_id.0, &req).await
}

pub async fn list_students(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.list_students(batch_id.0, &req).await
}

pub async fn add_students(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    body: web::Json<AddStudentsRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE
        .add_students(batch_id.0, body.into_inner(), &req)
        .await
}

pub async fn remove_student(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE
        .remove_student(batch_id.0, student_id.0, &req)
        .await
}

// 配置路由
//
// 班次下的课表、资源与反馈路由挂在同一个 scope 内，均需先通过 RequireJWT。
pub fn configure_batches_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/batches")
            .wrap(middlewares::RequireJWT)
            .service(
                // 按角色收窄：讲师看授课班次，学员看已加入班次
                web::resource("").route(web::get().to(list_batches)).route(
                    web::post()
                        .to(create_batch)
                        .wrap(RequireRole::new_any(UserRole::admin_roles())),
                ),
            )
            .configure(schedules::configure_batch_schedule_routes)
            .configure(resources::configure_batch_resource_routes)
            .configure(feedback::configure_batch_feedback_routes)
            .service(
                web::resource("/{batch_id}/students/{student_id}").route(
                    web::delete()
                        .to(remove_student)
                        .wrap(RequireRole::new_any(UserRole::admin_roles())),
                ),
            )
            .service(
                web::resource("/{batch_id}/students")
                    .route(
                        web::get()
                            .to(list_students)
                            .wrap(RequireBatchAccess::member()),
                    )
                    .route(
                        web::post()
                            .to(add_students)
                            .wrap(RequireRole::new_any(UserRole::admin_roles())),
                    ),
            )
            .service(
                web::resource("/{batch_id}")
                    .route(web::get().to(get_batch).wrap(RequireBatchAccess::member()))
                    .route(
                        web::put()
                            .to(update_batch)
                            .wrap(RequireRole::new_any(UserRole::admin_roles())),
                    )
                    .route(
                        web::delete()
                            .to(delete_batch)
                            .wrap(RequireRole::new_any(UserRole::admin_roles())),
                    ),
            ),
    );
}

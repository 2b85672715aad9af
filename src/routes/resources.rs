use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit, RequireBatchAccess, RequireRole};
use crate::models::resources::requests::BulkDeleteResourcesRequest;
use crate::models::users::entities::UserRole;
use crate::services::ResourceService;
use crate::utils::{SafeBatchIdI64, SafeIDI64};

static RESOURCE_SERVICE: Lazy<ResourceService> = Lazy::new(ResourceService::new_lazy);

pub async fn list_resources(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE.list_resources(batch_id.0, &req).await
}

pub async fn upload_resource(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE
        .upload_resource(batch_id.0, &req, payload)
        .await
}

pub async fn bulk_delete_resources(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    body: web::Json<BulkDeleteResourcesRequest>,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE
        .bulk_delete_resources(batch_id.0, body.into_inner(), &req)
        .await
}

pub async fn download_resource(
    req: HttpRequest,
    resource_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE
        .download_resource(resource_id.0, &req)
        .await
}

pub async fn delete_resource(
    req: HttpRequest,
    resource_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RESOURCE_SERVICE.delete_resource(resource_id.0, &req).await
}

/// `/api/v1/batches/{batch_id}/resources`，在班次 scope 内注册
pub fn configure_batch_resource_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{batch_id}/resources/bulk-delete").route(
            web::post()
                .to(bulk_delete_resources)
                .wrap(RequireBatchAccess::staff()),
        ),
    )
    .service(
        web::resource("/{batch_id}/resources")
            .route(
                web::get()
                    .to(list_resources)
                    .wrap(RequireBatchAccess::member()),
            )
            .route(
                web::post()
                    .to(upload_resource)
                    .wrap(RequireBatchAccess::staff())
                    .wrap(RateLimit::upload()),
            ),
    );
}

pub fn configure_resource_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/resources")
            .wrap(middlewares::RequireJWT)
            // 学员下载时检查反馈门控
            .route("/{id}/download", web::get().to(download_resource))
            .route(
                "/{id}",
                web::delete()
                    .to(delete_resource)
                    .wrap(RequireRole::new_any(UserRole::instructor_roles())),
            ),
    );
}

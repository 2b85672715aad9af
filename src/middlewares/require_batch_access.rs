/*!
 * 班次访问控制中间件
 *
 * 须在 RequireJWT 之后使用，作用于包含 `{batch_id}` 路径段的路由：
 * - 管理员：所有班次
 * - 讲师：自己授课的班次
 * - 学员：已加入的班次
 *
 * 通过后把 `Batch` 写入请求扩展，处理器无需再次查询。
 * `RequireBatchAccess::staff()` 进一步要求调用者为该班次的讲师或管理员。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error};

use crate::{
    domain::access,
    models::{ErrorCode, RequestContext, batches::entities::Batch, users::entities::UserRole},
    storage::Storage,
};

use super::create_error_response;

#[derive(Clone, Copy)]
pub struct RequireBatchAccess {
    staff_only: bool,
}

impl RequireBatchAccess {
    /// 班次成员（含讲师）即可
    pub fn member() -> Self {
        Self { staff_only: false }
    }

    /// 仅班次讲师或管理员
    pub fn staff() -> Self {
        Self { staff_only: true }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireBatchAccess
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireBatchAccessMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireBatchAccessMiddleware {
            service: Rc::new(service),
            staff_only: self.staff_only,
        }))
    }
}

pub struct RequireBatchAccessMiddleware<S> {
    service: Rc<S>,
    staff_only: bool,
}

enum Denial {
    BadRequest(&'static str),
    NotFound,
    Forbidden(&'static str),
    Internal,
}

async fn check_access(
    req: &ServiceRequest,
    ctx: &RequestContext,
    staff_only: bool,
) -> Result<Batch, Denial> {
    let batch_id = req
        .match_info()
        .get("batch_id")
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(Denial::BadRequest("Missing or invalid batch_id"))?;

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|s| s.get_ref().clone())
        .ok_or(Denial::Internal)?;

    let batch = storage
        .get_batch_by_id(batch_id)
        .await
        .map_err(|e| {
            error!("Failed to load batch {}: {}", batch_id, e);
            Denial::Internal
        })?
        .ok_or(Denial::NotFound)?;

    if access::can_manage_batch(ctx, &batch) {
        return Ok(batch);
    }
    if staff_only || ctx.role != UserRole::Student {
        return Err(Denial::Forbidden("No permission for this batch"));
    }

    let enrolled = storage
        .is_student_enrolled(batch_id, ctx.user_id)
        .await
        .map_err(|e| {
            error!("Failed to check enrolment for batch {}: {}", batch_id, e);
            Denial::Internal
        })?;

    if enrolled {
        Ok(batch)
    } else {
        Err(Denial::Forbidden("Not enrolled in this batch"))
    }
}

impl<S, B> Service<ServiceRequest> for RequireBatchAccessMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let staff_only = self.staff_only;

        Box::pin(async move {
            let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Unauthorized: missing request context",
                    )
                    .map_into_right_body(),
                ));
            };

            let response = match check_access(&req, &ctx, staff_only).await {
                Ok(batch) => {
                    debug!("User {} granted access to batch {}", ctx.user_id, batch.id);
                    req.extensions_mut().insert(batch);
                    return Ok(srv.call(req).await?.map_into_left_body());
                }
                Err(Denial::BadRequest(msg)) => {
                    create_error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg)
                }
                Err(Denial::NotFound) => create_error_response(
                    StatusCode::NOT_FOUND,
                    ErrorCode::BatchNotFound,
                    "Batch not found",
                ),
                Err(Denial::Forbidden(msg)) => create_error_response(
                    StatusCode::FORBIDDEN,
                    ErrorCode::BatchPermissionDenied,
                    msg,
                ),
                Err(Denial::Internal) => create_error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "Failed to verify batch access",
                ),
            };

            Ok(req.into_response(response.map_into_right_body()))
        })
    }
}

impl RequireBatchAccess {
    /// 取出已校验的班次，须在 RequireBatchAccess 之后调用
    pub fn extract_batch(req: &actix_web::HttpRequest) -> Option<Batch> {
        req.extensions().get::<Batch>().cloned()
    }
}

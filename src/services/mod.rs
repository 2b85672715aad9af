pub mod attendance;
pub mod auth;
pub mod batches;
pub mod courses;
pub mod dashboard;
pub mod feedback;
pub mod resources;
pub mod schedules;
pub mod users;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use batches::BatchService;
pub use courses::CourseService;
pub use dashboard::DashboardService;
pub use feedback::FeedbackService;
pub use resources::ResourceService;
pub use schedules::ScheduleService;
pub use users::UserService;

use actix_web::{
    HttpRequest, HttpResponse, Result as ActixResult, error::InternalError, http::StatusCode, web,
};
use std::sync::Arc;

use crate::errors::LmsError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, RequestContext};
use crate::storage::Storage;

// 从 app_data 取出存储实例
pub(crate) fn storage_from(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|s| s.get_ref().clone())
        .ok_or_else(|| {
            tracing::error!("Storage not found in app data");
            let response = HttpResponse::InternalServerError().json(
                ApiResponse::<()>::error_empty(ErrorCode::InternalServerError, "Storage unavailable"),
            );
            InternalError::from_response("storage unavailable", response).into()
        })
}

// 取出 RequireJWT 注入的请求上下文
pub(crate) fn require_context(request: &HttpRequest) -> ActixResult<RequestContext> {
    RequireJWT::extract_context(request).ok_or_else(|| {
        let response = HttpResponse::Unauthorized().json(ApiResponse::<()>::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        ));
        InternalError::from_response("missing request context", response).into()
    })
}

// 存储层错误统一转为 500
pub(crate) fn internal_error(action: &str, err: &LmsError) -> HttpResponse {
    tracing::error!("{} failed: {}", action, err);
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error_empty(
        ErrorCode::InternalServerError,
        format!("{action} failed: {}", err.message()),
    ))
}

/// 处理器内部的拒绝结果，可直接转为响应，也可作为批量操作中单条记录的错误
#[derive(Debug, Clone)]
pub(crate) struct Rejection {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

impl Rejection {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn internal(action: &str, err: &LmsError) -> Self {
        tracing::error!("{} failed: {}", action, err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            format!("{action} failed: {}", err.message()),
        )
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::build(self.status).json(ApiResponse::error_empty(self.code, self.message))
    }
}

// 唯一约束冲突（SQLite / PostgreSQL / MySQL 的报错文本不同）
pub(crate) fn is_unique_violation(err: &LmsError) -> bool {
    let msg = err.message();
    msg.contains("UNIQUE constraint failed")
        || msg.contains("duplicate key")
        || msg.contains("Duplicate entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unique_violation() {
        assert!(is_unique_violation(&LmsError::database_operation(
            "创建用户失败: UNIQUE constraint failed: users.username"
        )));
        assert!(!is_unique_violation(&LmsError::database_operation(
            "connection reset"
        )));
    }

    #[test]
    fn test_rejection_response_status() {
        let response =
            Rejection::forbidden(ErrorCode::ResourceLocked, "Resource is locked").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let rejection = Rejection::internal("Load batch", &LmsError::database_operation("boom"));
        assert_eq!(rejection.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rejection.message, "Load batch failed: boom");
    }

    #[test]
    fn test_storage_missing_is_error() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        assert!(storage_from(&req).is_err());
        assert!(require_context(&req).is_err());
    }
}

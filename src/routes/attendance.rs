use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireRole};
use crate::models::attendance::requests::BulkAttendanceRequest;
use crate::models::users::entities::UserRole;
use crate::services::AttendanceService;
use crate::utils::{SafeBatchIdI64, SafeStudentIdI64};

static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn bulk_mark_attendance(
    req: HttpRequest,
    body: web::Json<BulkAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .bulk_mark_attendance(body.into_inner(), &req)
        .await
}

pub async fn student_analytics(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .student_analytics(student_id.0, &req)
        .await
}

pub async fn batch_analytics(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.batch_analytics(batch_id.0, &req).await
}

// 分析接口的访问范围在处理器内按请求上下文判断
pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendance")
            .wrap(middlewares::RequireJWT)
            .route(
                "/bulk",
                web::post()
                    .to(bulk_mark_attendance)
                    .wrap(RequireRole::new_any(UserRole::instructor_roles())),
            )
            .route(
                "/analytics/students/{student_id}",
                web::get().to(student_analytics),
            )
            .route(
                "/analytics/batches/{batch_id}",
                web::get().to(batch_analytics),
            ),
    );
}

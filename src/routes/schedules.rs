use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireBatchAccess, RequireRole};
use crate::models::attendance::requests::MarkAttendanceRequest;
use crate::models::schedules::requests::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::models::users::entities::UserRole;
use crate::services::{AttendanceService, ScheduleService};
use crate::utils::{SafeBatchIdI64, SafeScheduleIdI64};

static SCHEDULE_SERVICE: Lazy<ScheduleService> = Lazy::new(ScheduleService::new_lazy);
static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn list_schedules(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.list_schedules(batch_id.0, &req).await
}

pub async fn create_schedule(
    req: HttpRequest,
    batch_id: SafeBatchIdI64,
    schedule: web::Json<CreateScheduleRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .create_schedule(batch_id.0, schedule.into_inner(), &req)
        .await
}

pub async fn update_schedule(
    req: HttpRequest,
    schedule_id: SafeScheduleIdI64,
    update: web::Json<UpdateScheduleRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .update_schedule(schedule_id.0, update.into_inner(), &req)
        .await
}

pub async fn delete_schedule(
    req: HttpRequest,
    schedule_id: SafeScheduleIdI64,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.delete_schedule(schedule_id.0, &req).await
}

pub async fn list_attendance(
    req: HttpRequest,
    schedule_id: SafeScheduleIdI64,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .list_attendance(schedule_id.0, &req)
        .await
}

pub async fn mark_attendance(
    req: HttpRequest,
    schedule_id: SafeScheduleIdI64,
    body: web::Json<MarkAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .mark_attendance(schedule_id.0, body.into_inner(), &req)
        .await
}

/// `/api/v1/batches/{batch_id}/schedules`，在班次 scope 内注册
pub fn configure_batch_schedule_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{batch_id}/schedules")
            .route(
                web::get()
                    .to(list_schedules)
                    .wrap(RequireBatchAccess::member()),
            )
            .route(
                web::post()
                    .to(create_schedule)
                    .wrap(RequireBatchAccess::staff()),
            ),
    );
}

// 课表修改与出勤标记在处理器内校验是否为该班次讲师
pub fn configure_schedule_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/schedules")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(RequireRole::new_any(UserRole::instructor_roles()))
                    .route("/{schedule_id}", web::put().to(update_schedule))
                    .route("/{schedule_id}", web::delete().to(delete_schedule))
                    .route("/{schedule_id}/attendance", web::get().to(list_attendance))
                    .route("/{schedule_id}/attendance", web::post().to(mark_attendance)),
            ),
    );
}

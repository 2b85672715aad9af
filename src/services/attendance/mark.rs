use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::AttendanceService;
use crate::domain::access;
use crate::models::attendance::{
    entities::{Attendance, AttendanceStatus},
    requests::{BulkAttendanceRequest, MarkAttendanceRequest},
    responses::{BulkAttendanceItemResult, BulkAttendanceResponse},
};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode, RequestContext};
use crate::services::{Rejection, require_context};
use crate::services::schedules::load_managed_schedule;
use crate::storage::Storage;

// 被标记的用户须为班次学员或该班次讲师；讲师只能记为出席
async fn mark_one(
    storage: &Arc<dyn Storage>,
    ctx: &RequestContext,
    schedule_id: i64,
    user_id: i64,
    status: AttendanceStatus,
) -> Result<Attendance, Rejection> {
    let (_, batch) = load_managed_schedule(storage, ctx, schedule_id).await?;

    let subject = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| Rejection::internal("Load user", &e))?
        .ok_or_else(|| Rejection::not_found(ErrorCode::UserNotFound, "User not found"))?;

    let member = match subject.role {
        UserRole::Instructor => subject.id == batch.instructor_id,
        UserRole::Student => storage
            .is_student_enrolled(batch.id, subject.id)
            .await
            .map_err(|e| Rejection::internal("Check enrolment", &e))?,
        UserRole::Admin => false,
    };
    if !member {
        return Err(Rejection::bad_request(
            ErrorCode::StudentNotEnrolled,
            "User is not a member of this batch",
        ));
    }

    if !access::attendance_status_allowed(&subject.role, status) {
        return Err(Rejection::bad_request(
            ErrorCode::AttendanceInvalidStatus,
            "Instructors can only be marked present",
        ));
    }

    storage
        .upsert_attendance(schedule_id, user_id, status, ctx.user_id)
        .await
        .map_err(|e| Rejection::internal("Mark attendance", &e))
}

pub async fn mark_attendance(
    service: &AttendanceService,
    schedule_id: i64,
    body: MarkAttendanceRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    match mark_one(&storage, &ctx, schedule_id, body.user_id, body.status).await {
        Ok(attendance) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            attendance,
            "Attendance marked successfully",
        ))),
        Err(rejection) => Ok(rejection.into_response()),
    }
}

/// 逐条处理，单条失败不影响其余记录
pub async fn bulk_mark_attendance(
    service: &AttendanceService,
    body: BulkAttendanceRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if body.records.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            "records must not be empty",
        )));
    }

    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let mut results = Vec::with_capacity(body.records.len());
    for (index, record) in body.records.into_iter().enumerate() {
        let result = match mark_one(
            &storage,
            &ctx,
            record.schedule_id,
            record.user_id,
            record.status,
        )
        .await
        {
            Ok(attendance) => BulkAttendanceItemResult {
                index,
                success: true,
                error: None,
                attendance: Some(attendance),
            },
            Err(rejection) => BulkAttendanceItemResult {
                index,
                success: false,
                error: Some(rejection.message),
                attendance: None,
            },
        };
        results.push(result);
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;
    tracing::info!(
        "Bulk attendance by {}: {} succeeded, {} failed",
        ctx.user_id,
        succeeded,
        failed
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        BulkAttendanceResponse {
            succeeded,
            failed,
            results,
        },
        "Bulk attendance processed",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::requests::BulkAttendanceRecord;
    use crate::models::schedules::requests::CreateScheduleRequest;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, test_support};
    use actix_web::{HttpMessage, http::StatusCode, test::TestRequest, web};
    use chrono::{Duration, Utc};

    struct Setup {
        storage: Arc<dyn Storage>,
        instructor_id: i64,
        student_id: i64,
        outsider_id: i64,
        schedule_id: i64,
    }

    async fn setup() -> Setup {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "alice", UserRole::Student).await;
        let outsider = test_support::user(&storage, "eve", UserRole::Student).await;
        storage.enroll_student_impl(batch.id, student.id).await.unwrap();
        let schedule = storage
            .create_schedule_impl(
                batch.id,
                CreateScheduleRequest {
                    title: "第一课".to_string(),
                    start_time: Utc::now(),
                    end_time: Utc::now() + Duration::hours(2),
                    meeting_link: None,
                },
                instructor.id,
            )
            .await
            .unwrap();

        Setup {
            storage: Arc::new(storage),
            instructor_id: instructor.id,
            student_id: student.id,
            outsider_id: outsider.id,
            schedule_id: schedule.id,
        }
    }

    fn request(storage: &Arc<dyn Storage>, ctx: RequestContext) -> HttpRequest {
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        req.extensions_mut().insert(ctx);
        req
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_instructor_subject_only_present() {
        let s = setup().await;
        let service = AttendanceService::new_lazy();
        let req = request(
            &s.storage,
            RequestContext::new(s.instructor_id, UserRole::Instructor),
        );

        let response = mark_attendance(
            &service,
            s.schedule_id,
            MarkAttendanceRequest {
                user_id: s.instructor_id,
                status: AttendanceStatus::Absent,
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], ErrorCode::AttendanceInvalidStatus as i32);

        let response = mark_attendance(
            &service,
            s.schedule_id,
            MarkAttendanceRequest {
                user_id: s.instructor_id,
                status: AttendanceStatus::Present,
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_other_instructor_cannot_mark() {
        let s = setup().await;
        let req = request(&s.storage, RequestContext::new(4242, UserRole::Instructor));
        let response = mark_attendance(
            &AttendanceService::new_lazy(),
            s.schedule_id,
            MarkAttendanceRequest {
                user_id: s.student_id,
                status: AttendanceStatus::Present,
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_bulk_reports_each_record() {
        let s = setup().await;
        let req = request(
            &s.storage,
            RequestContext::new(s.instructor_id, UserRole::Instructor),
        );
        let record = |schedule_id, user_id, status| BulkAttendanceRecord {
            schedule_id,
            user_id,
            status,
        };

        let response = bulk_mark_attendance(
            &AttendanceService::new_lazy(),
            BulkAttendanceRequest {
                records: vec![
                    record(s.schedule_id, s.student_id, AttendanceStatus::Late),
                    record(s.schedule_id, s.outsider_id, AttendanceStatus::Present),
                    record(s.schedule_id, s.instructor_id, AttendanceStatus::Late),
                    record(9999, s.student_id, AttendanceStatus::Present),
                    record(s.schedule_id, s.instructor_id, AttendanceStatus::Present),
                ],
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let data = &json["data"];
        assert_eq!(data["succeeded"], 2);
        assert_eq!(data["failed"], 3);
        let flags: Vec<bool> = data["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["success"].as_bool().unwrap())
            .collect();
        assert_eq!(flags, vec![true, false, false, false, true]);
        assert_eq!(data["results"][1]["index"], 1);
        assert!(data["results"][1]["error"].is_string());
        assert_eq!(data["results"][0]["attendance"]["status"], "late");

        let records = s.storage.list_schedule_attendance(s.schedule_id).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_rejects_empty_records() {
        let s = setup().await;
        let req = request(&s.storage, RequestContext::new(1, UserRole::Admin));
        let response = bulk_mark_attendance(
            &AttendanceService::new_lazy(),
            BulkAttendanceRequest {
                records: Vec::new(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

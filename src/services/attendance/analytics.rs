use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

use super::AttendanceService;
use crate::domain::access;
use crate::domain::attendance_stats::{self, BatchAttendanceInput};
use crate::models::attendance::{
    entities::{Attendance, AttendanceStatus},
    responses::{
        BatchAttendanceAnalytics, BatchAttendanceSummary, StudentAttendanceAnalytics,
        StudentAttendanceSummary,
    },
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, require_context};

// 按用户分组
fn group_by_user(records: Vec<Attendance>) -> HashMap<i64, Vec<AttendanceStatus>> {
    let mut grouped: HashMap<i64, Vec<AttendanceStatus>> = HashMap::new();
    for record in records {
        grouped.entry(record.user_id).or_default().push(record.status);
    }
    grouped
}

/// 学员出勤分析
///
/// 讲师只能看到自己授课的班次，学员只能查看自己。
pub async fn student_analytics(
    service: &AttendanceService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    if !access::can_view_student_analytics(&ctx, student_id) {
        return Ok(Rejection::forbidden(
            ErrorCode::PermissionDenied,
            "Students can only view their own attendance",
        )
        .into_response());
    }

    let storage = service.get_storage(request)?;

    match storage.get_user_by_id(student_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(
                Rejection::not_found(ErrorCode::UserNotFound, "User not found").into_response(),
            );
        }
        Err(e) => return Ok(Rejection::internal("Load student", &e).into_response()),
    }

    let batches = match storage.list_student_batches(student_id).await {
        Ok(batches) => batches,
        Err(e) => return Ok(Rejection::internal("List student batches", &e).into_response()),
    };

    let mut inputs = Vec::new();
    for batch in access::visible_batches_for(&ctx, &batches) {
        let schedule_count = match storage.count_batch_schedules(batch.id).await {
            Ok(count) => count,
            Err(e) => return Ok(Rejection::internal("Count schedules", &e).into_response()),
        };
        let records = match storage
            .list_student_batch_attendance(batch.id, student_id)
            .await
        {
            Ok(records) => records,
            Err(e) => return Ok(Rejection::internal("List attendance", &e).into_response()),
        };
        inputs.push(BatchAttendanceInput {
            batch_id: batch.id,
            batch_name: batch.name.clone(),
            schedule_count,
            statuses: records.into_iter().map(|r| r.status).collect(),
        });
    }

    let (overall, by_batch) = attendance_stats::student_analytics(inputs);
    let response = StudentAttendanceAnalytics {
        student_id,
        overall,
        by_batch: by_batch
            .into_iter()
            .map(|(batch_id, batch_name, stats)| BatchAttendanceSummary {
                batch_id,
                batch_name,
                stats,
            })
            .collect(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Student attendance analytics retrieved successfully",
    )))
}

/// 班次出勤分析，分母为学员数 × 课表数
pub async fn batch_analytics(
    service: &AttendanceService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let storage = service.get_storage(request)?;

    let batch = match storage.get_batch_by_id(batch_id).await {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            return Ok(
                Rejection::not_found(ErrorCode::BatchNotFound, "Batch not found").into_response(),
            );
        }
        Err(e) => return Ok(Rejection::internal("Load batch", &e).into_response()),
    };

    if !access::can_view_batch_analytics(&ctx, &batch) {
        return Ok(Rejection::forbidden(
            ErrorCode::BatchPermissionDenied,
            "No permission for this batch",
        )
        .into_response());
    }

    let students = match storage.list_batch_students(batch_id).await {
        Ok(students) => students,
        Err(e) => return Ok(Rejection::internal("List batch students", &e).into_response()),
    };
    let schedule_count = match storage.count_batch_schedules(batch_id).await {
        Ok(count) => count,
        Err(e) => return Ok(Rejection::internal("Count schedules", &e).into_response()),
    };
    let mut grouped = match storage.list_batch_attendance(batch_id).await {
        Ok(records) => group_by_user(records),
        Err(e) => return Ok(Rejection::internal("List attendance", &e).into_response()),
    };

    // 讲师自己的出勤记录不计入学员统计
    let inputs = students
        .iter()
        .map(|s| (s.student_id, grouped.remove(&s.student_id).unwrap_or_default()))
        .collect();
    let (overall, per_student) = attendance_stats::batch_analytics(inputs, schedule_count);

    let response = BatchAttendanceAnalytics {
        batch_id,
        batch_name: batch.name,
        total_students: students.len() as i64,
        total_classes: schedule_count,
        overall,
        students: students
            .into_iter()
            .zip(per_student)
            .map(|(student, (_, stats))| StudentAttendanceSummary {
                student_id: student.student_id,
                username: student.username,
                display_name: student.display_name,
                stats,
            })
            .collect(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Batch attendance analytics retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestContext;
    use crate::models::schedules::requests::CreateScheduleRequest;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, test_support};
    use actix_web::{HttpMessage, http::StatusCode, test::TestRequest, web};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

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

    /// 一个班次、两名学员、五次课
    async fn setup() -> (Arc<dyn Storage>, i64, i64, i64, i64) {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let alice = test_support::user(&storage, "alice", UserRole::Student).await;
        let bob = test_support::user(&storage, "bob", UserRole::Student).await;
        storage.enroll_student_impl(batch.id, alice.id).await.unwrap();
        storage.enroll_student_impl(batch.id, bob.id).await.unwrap();

        let start = Utc::now();
        for i in 0..5 {
            let schedule = storage
                .create_schedule_impl(
                    batch.id,
                    CreateScheduleRequest {
                        title: format!("第 {} 课", i + 1),
                        start_time: start + Duration::days(i),
                        end_time: start + Duration::days(i) + Duration::hours(1),
                        meeting_link: None,
                    },
                    instructor.id,
                )
                .await
                .unwrap();
            // alice 全勤，bob 只出席前两次
            storage
                .upsert_attendance_impl(schedule.id, alice.id, AttendanceStatus::Present, instructor.id)
                .await
                .unwrap();
            let status = if i < 2 {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            storage
                .upsert_attendance_impl(schedule.id, bob.id, status, instructor.id)
                .await
                .unwrap();
        }

        (Arc::new(storage), instructor.id, batch.id, alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_batch_analytics_uses_students_times_schedules() {
        let (storage, instructor_id, batch_id, _, _) = setup().await;
        let service = AttendanceService::new_lazy();
        let req = request(&storage, RequestContext::new(instructor_id, UserRole::Instructor));

        let response = batch_analytics(&service, batch_id, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = &json["data"];
        assert_eq!(data["total_students"], 2);
        assert_eq!(data["total_classes"], 5);
        assert_eq!(data["overall"]["total"], 10);
        assert_eq!(data["overall"]["present"], 7);
        assert_eq!(data["overall"]["percentage"], 70);
        assert_eq!(data["students"][1]["percentage"], 40);
    }

    #[tokio::test]
    async fn test_batch_analytics_access() {
        let (storage, _, batch_id, alice_id, _) = setup().await;
        let service = AttendanceService::new_lazy();

        let req = request(&storage, RequestContext::new(alice_id, UserRole::Student));
        let response = batch_analytics(&service, batch_id, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let req = request(&storage, RequestContext::new(1, UserRole::Admin));
        let response = batch_analytics(&service, 9999, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_student_analytics_self_only() {
        let (storage, _, _, alice_id, bob_id) = setup().await;
        let service = AttendanceService::new_lazy();

        let req = request(&storage, RequestContext::new(alice_id, UserRole::Student));
        let response = student_analytics(&service, bob_id, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = student_analytics(&service, alice_id, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["overall"]["percentage"], 100);
        assert_eq!(json["data"]["by_batch"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_student_analytics_filters_other_instructors() {
        let (storage, _, _, alice_id, _) = setup().await;
        let service = AttendanceService::new_lazy();

        let req = request(&storage, RequestContext::new(4242, UserRole::Instructor));
        let response = student_analytics(&service, alice_id, &req).await.unwrap();
        let json = body_json(response).await;
        assert!(json["data"]["by_batch"].as_array().unwrap().is_empty());
        assert_eq!(json["data"]["overall"]["total"], 0);
        assert_eq!(json["data"]["overall"]["percentage"], 0);
    }

    #[tokio::test]
    async fn test_student_analytics_missing_user() {
        let (storage, ..) = setup().await;
        let service = AttendanceService::new_lazy();
        let req = request(&storage, RequestContext::new(1, UserRole::Admin));
        let response = student_analytics(&service, 9999, &req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

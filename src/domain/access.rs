//! 访问控制判断
//!
//! 所有判断只依赖调用方身份与目标对象，结果由处理器转换为 HTTP 响应。

use crate::models::RequestContext;
use crate::models::attendance::entities::AttendanceStatus;
use crate::models::batches::entities::Batch;
use crate::models::users::entities::UserRole;

/// 是否可以管理班次内容（课表、资源、出勤）
pub fn can_manage_batch(ctx: &RequestContext, batch: &Batch) -> bool {
    ctx.is_admin() || (ctx.is_instructor() && batch.instructor_id == ctx.user_id)
}

/// 是否可以查看某学员的出勤分析
pub fn can_view_student_analytics(ctx: &RequestContext, student_id: i64) -> bool {
    match ctx.role {
        UserRole::Admin | UserRole::Instructor => true,
        UserRole::Student => ctx.user_id == student_id,
    }
}

/// 讲师查看学员分析时只能看到自己授课的班次
pub fn visible_batches_for<'a>(ctx: &RequestContext, batches: &'a [Batch]) -> Vec<&'a Batch> {
    batches
        .iter()
        .filter(|b| !ctx.is_instructor() || b.instructor_id == ctx.user_id)
        .collect()
}

/// 是否可以查看班次出勤分析
pub fn can_view_batch_analytics(ctx: &RequestContext, batch: &Batch) -> bool {
    can_manage_batch(ctx, batch)
}

/// 讲师自身只能被记为出席
pub fn attendance_status_allowed(subject_role: &UserRole, status: AttendanceStatus) -> bool {
    match subject_role {
        UserRole::Instructor => status == AttendanceStatus::Present,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batches::entities::BatchStatus;
    use chrono::Utc;

    fn batch(instructor_id: i64) -> Batch {
        Batch {
            id: 1,
            course_id: 1,
            instructor_id,
            name: "2025 春季班".to_string(),
            start_date: None,
            end_date: None,
            status: BatchStatus::Ongoing,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_manage_batch() {
        let b = batch(7);
        assert!(can_manage_batch(&RequestContext::new(1, UserRole::Admin), &b));
        assert!(can_manage_batch(&RequestContext::new(7, UserRole::Instructor), &b));
        assert!(!can_manage_batch(&RequestContext::new(8, UserRole::Instructor), &b));
        assert!(!can_manage_batch(&RequestContext::new(7, UserRole::Student), &b));
    }

    #[test]
    fn test_student_analytics_self_only() {
        let ctx = RequestContext::new(3, UserRole::Student);
        assert!(can_view_student_analytics(&ctx, 3));
        assert!(!can_view_student_analytics(&ctx, 4));
        let ctx = RequestContext::new(9, UserRole::Instructor);
        assert!(can_view_student_analytics(&ctx, 4));
    }

    #[test]
    fn test_instructor_sees_own_batches() {
        let batches = vec![batch(7), batch(8)];
        let ctx = RequestContext::new(7, UserRole::Instructor);
        assert_eq!(visible_batches_for(&ctx, &batches).len(), 1);
        let ctx = RequestContext::new(1, UserRole::Admin);
        assert_eq!(visible_batches_for(&ctx, &batches).len(), 2);
    }

    #[test]
    fn test_instructor_attendance_present_only() {
        assert!(attendance_status_allowed(
            &UserRole::Instructor,
            AttendanceStatus::Present
        ));
        assert!(!attendance_status_allowed(
            &UserRole::Instructor,
            AttendanceStatus::Late
        ));
        assert!(attendance_status_allowed(
            &UserRole::Student,
            AttendanceStatus::Absent
        ));
    }
}

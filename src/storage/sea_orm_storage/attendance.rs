//! 出勤存储操作

use super::SeaOrmStorage;
use crate::entity::attendance::{ActiveModel, Column, Entity as AttendanceRecords};
use crate::entity::schedules::{Column as ScheduleColumn, Entity as Schedules};
use crate::errors::{LmsError, Result};
use crate::models::attendance::entities::{Attendance, AttendanceStatus};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 标记出勤，已存在则覆盖状态
    ///
    /// 以 (schedule_id, user_id) 为冲突键的单条 upsert，并发标记时后写入者生效。
    pub async fn upsert_attendance_impl(
        &self,
        schedule_id: i64,
        user_id: i64,
        status: AttendanceStatus,
        marked_by: i64,
    ) -> Result<Attendance> {
        let model = ActiveModel {
            schedule_id: Set(schedule_id),
            user_id: Set(user_id),
            status: Set(status.to_string()),
            marked_by: Set(marked_by),
            marked_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        AttendanceRecords::insert(model)
            .on_conflict(
                OnConflict::columns([Column::ScheduleId, Column::UserId])
                    .update_columns([Column::Status, Column::MarkedBy, Column::MarkedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("保存出勤记录失败: {e}")))?;

        AttendanceRecords::find()
            .filter(Column::ScheduleId.eq(schedule_id))
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询出勤记录失败: {e}")))?
            .map(|m| m.into_attendance())
            .ok_or_else(|| LmsError::not_found("保存后未找到出勤记录"))
    }

    pub async fn list_schedule_attendance_impl(&self, schedule_id: i64) -> Result<Vec<Attendance>> {
        let records = AttendanceRecords::find()
            .filter(Column::ScheduleId.eq(schedule_id))
            .order_by_asc(Column::UserId)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询出勤记录失败: {e}")))?;

        Ok(records.into_iter().map(|m| m.into_attendance()).collect())
    }

    /// 班次下所有课表的出勤记录，`user_id` 为 Some 时只取该用户
    async fn query_batch_attendance(
        &self,
        batch_id: i64,
        user_id: Option<i64>,
    ) -> Result<Vec<Attendance>> {
        let schedule_ids: Vec<i64> = Schedules::find()
            .select_only()
            .column(ScheduleColumn::Id)
            .filter(ScheduleColumn::BatchId.eq(batch_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课表失败: {e}")))?;

        if schedule_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = AttendanceRecords::find().filter(Column::ScheduleId.is_in(schedule_ids));
        if let Some(user_id) = user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        let records = select
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询出勤记录失败: {e}")))?;

        Ok(records.into_iter().map(|m| m.into_attendance()).collect())
    }

    pub async fn list_batch_attendance_impl(&self, batch_id: i64) -> Result<Vec<Attendance>> {
        self.query_batch_attendance(batch_id, None).await
    }

    pub async fn list_student_batch_attendance_impl(
        &self,
        batch_id: i64,
        student_id: i64,
    ) -> Result<Vec<Attendance>> {
        self.query_batch_attendance(batch_id, Some(student_id)).await
    }

    /// 统计全部出勤记录：(出席数, 总数)
    pub async fn count_attendance_impl(&self) -> Result<(i64, i64)> {
        let total = AttendanceRecords::find()
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计出勤记录失败: {e}")))?;
        let present = AttendanceRecords::find()
            .filter(Column::Status.eq(AttendanceStatus::Present.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计出勤记录失败: {e}")))?;

        Ok((present as i64, total as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use crate::models::schedules::requests::CreateScheduleRequest;
    use crate::models::users::entities::UserRole;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_upsert_keeps_single_record() {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "stu", UserRole::Student).await;
        let schedule = storage
            .create_schedule_impl(
                batch.id,
                CreateScheduleRequest {
                    title: "第一课".to_string(),
                    start_time: Utc::now(),
                    end_time: Utc::now() + Duration::hours(1),
                    meeting_link: None,
                },
                instructor.id,
            )
            .await
            .unwrap();

        let first = storage
            .upsert_attendance_impl(schedule.id, student.id, AttendanceStatus::Absent, instructor.id)
            .await
            .unwrap();
        let second = storage
            .upsert_attendance_impl(schedule.id, student.id, AttendanceStatus::Late, instructor.id)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, AttendanceStatus::Late);

        let records = storage.list_batch_attendance_impl(batch.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(storage.count_attendance_impl().await.unwrap(), (0, 1));

        let other = test_support::user(&storage, "other", UserRole::Student).await;
        storage
            .upsert_attendance_impl(schedule.id, other.id, AttendanceStatus::Present, instructor.id)
            .await
            .unwrap();
        let own = storage
            .list_student_batch_attendance_impl(batch.id, student.id)
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].user_id, student.id);
        assert_eq!(storage.list_batch_attendance_impl(batch.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_marks_keep_one_record() {
        let storage = SeaOrmStorage::file_backed(4).await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "stu", UserRole::Student).await;
        let schedule = storage
            .create_schedule_impl(
                batch.id,
                CreateScheduleRequest {
                    title: "第一课".to_string(),
                    start_time: Utc::now(),
                    end_time: Utc::now() + Duration::hours(1),
                    meeting_link: None,
                },
                instructor.id,
            )
            .await
            .unwrap();

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let storage = storage.clone();
                let status = if i % 2 == 0 {
                    AttendanceStatus::Present
                } else {
                    AttendanceStatus::Absent
                };
                let (schedule_id, student_id, marker) = (schedule.id, student.id, instructor.id);
                tokio::spawn(async move {
                    storage
                        .upsert_attendance_impl(schedule_id, student_id, status, marker)
                        .await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        let records = storage.list_schedule_attendance_impl(schedule.id).await.unwrap();
        assert_eq!(records.len(), 1);
    }
}

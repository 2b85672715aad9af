//! 课表存储操作

use super::SeaOrmStorage;
use crate::entity::schedules::{ActiveModel, Column, Entity as Schedules};
use crate::errors::{LmsError, Result};
use crate::models::schedules::{
    entities::Schedule,
    requests::{CreateScheduleRequest, UpdateScheduleRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    pub async fn create_schedule_impl(
        &self,
        batch_id: i64,
        req: CreateScheduleRequest,
        created_by: i64,
    ) -> Result<Schedule> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            batch_id: Set(batch_id),
            title: Set(req.title),
            start_time: Set(req.start_time.timestamp()),
            end_time: Set(req.end_time.timestamp()),
            meeting_link: Set(req.meeting_link),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建课表失败: {e}")))?;

        Ok(result.into_schedule())
    }

    pub async fn get_schedule_by_id_impl(&self, schedule_id: i64) -> Result<Option<Schedule>> {
        let result = Schedules::find_by_id(schedule_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课表失败: {e}")))?;

        Ok(result.map(|m| m.into_schedule()))
    }

    pub async fn list_batch_schedules_impl(&self, batch_id: i64) -> Result<Vec<Schedule>> {
        let schedules = Schedules::find()
            .filter(Column::BatchId.eq(batch_id))
            .order_by_asc(Column::StartTime)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课表列表失败: {e}")))?;

        Ok(schedules.into_iter().map(|m| m.into_schedule()).collect())
    }

    pub async fn update_schedule_impl(
        &self,
        schedule_id: i64,
        update: UpdateScheduleRequest,
    ) -> Result<Option<Schedule>> {
        if self.get_schedule_by_id_impl(schedule_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(schedule_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(start_time) = update.start_time {
            model.start_time = Set(start_time.timestamp());
        }
        if let Some(end_time) = update.end_time {
            model.end_time = Set(end_time.timestamp());
        }
        if let Some(meeting_link) = update.meeting_link {
            model.meeting_link = Set(Some(meeting_link));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新课表失败: {e}")))?;

        Ok(Some(updated.into_schedule()))
    }

    pub async fn delete_schedule_impl(&self, schedule_id: i64) -> Result<bool> {
        let result = Schedules::delete_by_id(schedule_id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除课表失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_batch_schedules_impl(&self, batch_id: i64) -> Result<i64> {
        let count = Schedules::find()
            .filter(Column::BatchId.eq(batch_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计课表数量失败: {e}")))?;

        Ok(count as i64)
    }

    pub async fn count_schedules_impl(&self) -> Result<i64> {
        let count = Schedules::find()
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计课表数量失败: {e}")))?;

        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_schedules_sorted_by_start_time() {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let base = Utc::now();

        for (title, offset) in [("第二课", 2), ("第一课", 1)] {
            storage
                .create_schedule_impl(
                    batch.id,
                    CreateScheduleRequest {
                        title: title.to_string(),
                        start_time: base + Duration::days(offset),
                        end_time: base + Duration::days(offset) + Duration::hours(1),
                        meeting_link: None,
                    },
                    instructor.id,
                )
                .await
                .unwrap();
        }

        let schedules = storage.list_batch_schedules_impl(batch.id).await.unwrap();
        assert_eq!(schedules[0].title, "第一课");
        assert_eq!(storage.count_batch_schedules_impl(batch.id).await.unwrap(), 2);

        assert!(storage.delete_schedule_impl(schedules[0].id).await.unwrap());
        assert_eq!(storage.count_batch_schedules_impl(batch.id).await.unwrap(), 1);
    }
}

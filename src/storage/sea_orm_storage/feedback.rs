//! 班次反馈存储操作

use std::collections::BTreeSet;

use super::SeaOrmStorage;
use crate::entity::batch_feedback::{ActiveModel, Column, Entity as BatchFeedbacks};
use crate::errors::{LmsError, Result};
use crate::models::feedback::{entities::BatchFeedback, requests::SubmitFeedbackRequest};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

impl SeaOrmStorage {
    pub async fn list_submitted_intervals_impl(
        &self,
        batch_id: i64,
        student_id: i64,
    ) -> Result<BTreeSet<i64>> {
        let intervals: Vec<i32> = BatchFeedbacks::find()
            .select_only()
            .column(Column::FeedbackInterval)
            .filter(Column::BatchId.eq(batch_id))
            .filter(Column::StudentId.eq(student_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询反馈区间失败: {e}")))?;

        Ok(intervals.into_iter().map(i64::from).collect())
    }

    fn find_feedback(
        batch_id: i64,
        student_id: i64,
        interval: i32,
    ) -> sea_orm::Select<BatchFeedbacks> {
        BatchFeedbacks::find()
            .filter(Column::BatchId.eq(batch_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::FeedbackInterval.eq(interval))
    }

    /// 新建或覆盖同一区间的反馈，后写入者生效
    ///
    /// 写入为单条 `INSERT ... ON CONFLICT DO UPDATE`，并发提交同一区间不会失败。
    /// 返回值中的 bool 表示本次是否新建。
    pub async fn upsert_feedback_impl(
        &self,
        batch_id: i64,
        student_id: i64,
        req: SubmitFeedbackRequest,
    ) -> Result<(BatchFeedback, bool)> {
        let now = chrono::Utc::now().timestamp();
        let interval = i32::try_from(req.interval)
            .map_err(|_| LmsError::validation(format!("无效的反馈区间: {}", req.interval)))?;

        let existed = Self::find_feedback(batch_id, student_id, interval)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询反馈失败: {e}")))?
            .is_some();

        let model = ActiveModel {
            batch_id: Set(batch_id),
            student_id: Set(student_id),
            feedback_interval: Set(interval),
            rating: Set(req.rating),
            feedback: Set(req.feedback),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        BatchFeedbacks::insert(model)
            .on_conflict(
                OnConflict::columns([Column::BatchId, Column::StudentId, Column::FeedbackInterval])
                    .update_columns([Column::Rating, Column::Feedback, Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("保存反馈失败: {e}")))?;

        let saved = Self::find_feedback(batch_id, student_id, interval)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询反馈失败: {e}")))?
            .ok_or_else(|| LmsError::not_found("保存后未找到反馈记录"))?;

        // 同一秒内的覆盖写入也可能 created_at == updated_at，需结合写入前的查询
        let created = !existed && saved.created_at == saved.updated_at;
        Ok((saved.into_feedback(), created))
    }

    pub async fn list_batch_feedback_impl(
        &self,
        batch_id: i64,
        interval: Option<i64>,
    ) -> Result<Vec<BatchFeedback>> {
        let mut select = BatchFeedbacks::find().filter(Column::BatchId.eq(batch_id));
        if let Some(interval) = interval {
            select = select.filter(Column::FeedbackInterval.eq(interval));
        }

        let rows = select
            .order_by_asc(Column::FeedbackInterval)
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询反馈列表失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_feedback()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_resubmission_overwrites() {
        let storage = SeaOrmStorage::in_memory().await;
        let (_, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "stu", UserRole::Student).await;

        let (first, created) = storage
            .upsert_feedback_impl(
                batch.id,
                student.id,
                SubmitFeedbackRequest {
                    interval: 1,
                    rating: 2,
                    feedback: Some("节奏太快".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(created);

        let (second, created) = storage
            .upsert_feedback_impl(
                batch.id,
                student.id,
                SubmitFeedbackRequest {
                    interval: 1,
                    rating: 5,
                    feedback: None,
                },
            )
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.rating, 5);

        let all = storage.list_batch_feedback_impl(batch.id, None).await.unwrap();
        assert_eq!(all.len(), 1);
        let filtered = storage
            .list_batch_feedback_impl(batch.id, Some(2))
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_submissions_last_write_wins() {
        let storage = SeaOrmStorage::file_backed(4).await;
        let (_, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "stu", UserRole::Student).await;

        for interval in 1..=20 {
            let tasks: Vec<_> = [2, 4]
                .into_iter()
                .map(|rating| {
                    let storage = storage.clone();
                    let (batch_id, student_id) = (batch.id, student.id);
                    tokio::spawn(async move {
                        storage
                            .upsert_feedback_impl(
                                batch_id,
                                student_id,
                                SubmitFeedbackRequest {
                                    interval,
                                    rating,
                                    feedback: None,
                                },
                            )
                            .await
                    })
                })
                .collect();

            for task in tasks {
                let result = task.await.unwrap();
                assert!(result.is_ok(), "interval {interval}: {:?}", result.err());
            }

            let rows = storage
                .list_batch_feedback_impl(batch.id, Some(interval))
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);
            assert!(rows[0].rating == 2 || rows[0].rating == 4);
        }
    }
}

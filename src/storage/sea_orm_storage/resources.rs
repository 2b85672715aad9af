//! 资源存储操作

use std::collections::BTreeSet;

use super::SeaOrmStorage;
use crate::domain::feedback_gate;
use crate::entity::batch_feedback::{Column as FeedbackColumn, Entity as BatchFeedbacks};
use crate::entity::resources::{ActiveModel, Column, Entity as Resources};
use crate::errors::{LmsError, Result};
use crate::models::resources::{entities::Resource, requests::CreateResourceRequest};
use crate::storage::ResourceDeletion;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    pub async fn create_resource_impl(&self, req: CreateResourceRequest) -> Result<Resource> {
        let model = ActiveModel {
            batch_id: Set(req.batch_id),
            title: Set(req.title),
            resource_type: Set(req.resource_type.to_string()),
            file_name: Set(req.file_name),
            stored_name: Set(req.stored_name),
            file_size: Set(req.file_size),
            content_type: Set(req.content_type),
            uploaded_by: Set(req.uploaded_by),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建资源失败: {e}")))?;

        Ok(result.into_resource())
    }

    pub async fn get_resource_by_id_impl(&self, resource_id: i64) -> Result<Option<Resource>> {
        let result = Resources::find_by_id(resource_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询资源失败: {e}")))?;

        Ok(result.map(|m| m.into_resource()))
    }

    /// 按 (created_at, id) 升序列出班次资源
    pub async fn list_batch_resources_impl(&self, batch_id: i64) -> Result<Vec<Resource>> {
        let resources = Resources::find()
            .filter(Column::BatchId.eq(batch_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询资源列表失败: {e}")))?;

        Ok(resources.into_iter().map(|m| m.into_resource()).collect())
    }

    pub async fn count_batch_resources_impl(&self, batch_id: i64) -> Result<i64> {
        let count = Resources::find()
            .filter(Column::BatchId.eq(batch_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计资源数量失败: {e}")))?;

        Ok(count as i64)
    }

    pub async fn count_resources_impl(&self) -> Result<i64> {
        let count = Resources::find()
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计资源数量失败: {e}")))?;

        Ok(count as i64)
    }

    /// 删除资源并清理超出剩余区间范围的反馈
    ///
    /// 不属于该班次的 ID 被忽略。
    pub async fn delete_resources_impl(
        &self,
        batch_id: i64,
        resource_ids: &[i64],
    ) -> Result<ResourceDeletion> {
        if resource_ids.is_empty() {
            return Ok(ResourceDeletion::default());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let targets = Resources::find()
            .filter(Column::BatchId.eq(batch_id))
            .filter(Column::Id.is_in(resource_ids.to_vec()))
            .all(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询资源失败: {e}")))?;

        if targets.is_empty() {
            txn.rollback().await?;
            return Ok(ResourceDeletion::default());
        }

        let target_ids: Vec<i64> = targets.iter().map(|r| r.id).collect();
        Resources::delete_many()
            .filter(Column::Id.is_in(target_ids))
            .exec(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除资源失败: {e}")))?;

        let remaining = Resources::find()
            .filter(Column::BatchId.eq(batch_id))
            .count(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计资源数量失败: {e}")))?;

        let existing: BTreeSet<i64> = BatchFeedbacks::find()
            .select_only()
            .column(FeedbackColumn::FeedbackInterval)
            .filter(FeedbackColumn::BatchId.eq(batch_id))
            .distinct()
            .into_tuple::<i32>()
            .all(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询反馈区间失败: {e}")))?
            .into_iter()
            .map(i64::from)
            .collect();

        let stale = feedback_gate::stale_feedback_intervals(remaining as i64, &existing);
        let pruned_feedback = if stale.is_empty() {
            0
        } else {
            let stale: Vec<i32> = stale.into_iter().map(|i| i as i32).collect();
            BatchFeedbacks::delete_many()
                .filter(FeedbackColumn::BatchId.eq(batch_id))
                .filter(FeedbackColumn::FeedbackInterval.is_in(stale))
                .exec(&txn)
                .await
                .map_err(|e| LmsError::database_operation(format!("清理反馈失败: {e}")))?
                .rows_affected
        };

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(ResourceDeletion {
            deleted: targets.into_iter().map(|m| m.into_resource()).collect(),
            pruned_feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use crate::models::feedback::requests::SubmitFeedbackRequest;
    use crate::models::resources::entities::ResourceType;
    use crate::models::users::entities::UserRole;

    async fn seed_resources(storage: &SeaOrmStorage, batch_id: i64, uploader: i64, n: i64) {
        for i in 0..n {
            storage
                .create_resource_impl(CreateResourceRequest {
                    batch_id,
                    title: format!("第{i}讲"),
                    resource_type: ResourceType::Recording,
                    file_name: format!("lesson{i}.mp4"),
                    stored_name: format!("{batch_id}-{i}.mp4"),
                    file_size: 1024,
                    content_type: "video/mp4".to_string(),
                    uploaded_by: uploader,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_deletion_prunes_stale_feedback() {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "stu", UserRole::Student).await;
        seed_resources(&storage, batch.id, instructor.id, 12).await;

        for interval in 1..=3 {
            storage
                .upsert_feedback_impl(
                    batch.id,
                    student.id,
                    SubmitFeedbackRequest {
                        interval,
                        rating: 4,
                        feedback: None,
                    },
                )
                .await
                .unwrap();
        }

        let resources = storage.list_batch_resources_impl(batch.id).await.unwrap();
        let doomed: Vec<i64> = resources.iter().rev().take(5).map(|r| r.id).collect();

        let result = storage
            .delete_resources_impl(batch.id, &doomed)
            .await
            .unwrap();
        assert_eq!(result.deleted.len(), 5);
        assert_eq!(result.pruned_feedback, 1);
        assert_eq!(storage.count_batch_resources_impl(batch.id).await.unwrap(), 7);

        let intervals = storage
            .list_submitted_intervals_impl(batch.id, student.id)
            .await
            .unwrap();
        assert_eq!(intervals.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_deletion_ignores_foreign_batch_ids() {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        seed_resources(&storage, batch.id, instructor.id, 2).await;
        let resources = storage.list_batch_resources_impl(batch.id).await.unwrap();

        let result = storage
            .delete_resources_impl(batch.id + 100, &[resources[0].id])
            .await
            .unwrap();
        assert!(result.deleted.is_empty());
        assert_eq!(storage.count_batch_resources_impl(batch.id).await.unwrap(), 2);
    }
}

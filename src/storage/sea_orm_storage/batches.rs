//! 班次与班次学员存储操作

use super::SeaOrmStorage;
use crate::entity::batches::{ActiveModel, Column, Entity as Batches};
use crate::entity::student_batches::{
    ActiveModel as StudentBatchActiveModel, Column as StudentBatchColumn,
    Entity as StudentBatches,
};
use crate::entity::student_courses::{
    ActiveModel as StudentCourseActiveModel, Column as StudentCourseColumn,
    Entity as StudentCourses,
};
use crate::entity::users::Entity as Users;
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo,
    batches::{
        entities::{Batch, BatchStatus, BatchStudent},
        requests::{BatchListQuery, CreateBatchRequest, UpdateBatchRequest},
        responses::BatchListResponse,
    },
    common::clamp_pagination,
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    pub async fn create_batch_impl(&self, req: CreateBatchRequest) -> Result<Batch> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            course_id: Set(req.course_id),
            instructor_id: Set(req.instructor_id),
            name: Set(req.name),
            start_date: Set(req.start_date.map(|d| d.timestamp())),
            end_date: Set(req.end_date.map(|d| d.timestamp())),
            status: Set(req.status.unwrap_or(BatchStatus::Upcoming).to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建班次失败: {e}")))?;

        Ok(result.into_batch())
    }

    pub async fn get_batch_by_id_impl(&self, batch_id: i64) -> Result<Option<Batch>> {
        let result = Batches::find_by_id(batch_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询班次失败: {e}")))?;

        Ok(result.map(|m| m.into_batch()))
    }

    /// 分页列出班次
    ///
    /// instructor_id / student_id 用于按调用者角色收窄范围。
    pub async fn list_batches_with_pagination_impl(
        &self,
        query: BatchListQuery,
    ) -> Result<BatchListResponse> {
        let (page, size) = clamp_pagination(query.page, query.size);

        let mut select = Batches::find();

        if let Some(student_id) = query.student_id {
            let batch_ids = self.student_batch_ids(student_id).await?;
            select = select.filter(Column::Id.is_in(batch_ids));
        }
        if let Some(instructor_id) = query.instructor_id {
            select = select.filter(Column::InstructorId.eq(instructor_id));
        }
        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }
        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Name.contains(&escaped));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询班次总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询班次页数失败: {e}")))?;
        let batches = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询班次列表失败: {e}")))?;

        Ok(BatchListResponse {
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
            items: batches.into_iter().map(|m| m.into_batch()).collect(),
        })
    }

    pub async fn update_batch_impl(
        &self,
        batch_id: i64,
        update: UpdateBatchRequest,
    ) -> Result<Option<Batch>> {
        if self.get_batch_by_id_impl(batch_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(batch_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(instructor_id) = update.instructor_id {
            model.instructor_id = Set(instructor_id);
        }
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(start_date) = update.start_date {
            model.start_date = Set(Some(start_date.timestamp()));
        }
        if let Some(end_date) = update.end_date {
            model.end_date = Set(Some(end_date.timestamp()));
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新班次失败: {e}")))?;

        Ok(Some(updated.into_batch()))
    }

    pub async fn delete_batch_impl(&self, batch_id: i64) -> Result<bool> {
        let result = Batches::delete_by_id(batch_id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除班次失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    async fn student_batch_ids(&self, student_id: i64) -> Result<Vec<i64>> {
        StudentBatches::find()
            .select_only()
            .column(StudentBatchColumn::BatchId)
            .filter(StudentBatchColumn::StudentId.eq(student_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询学员班次失败: {e}")))
    }

    pub async fn list_student_batches_impl(&self, student_id: i64) -> Result<Vec<Batch>> {
        let batch_ids = self.student_batch_ids(student_id).await?;
        if batch_ids.is_empty() {
            return Ok(Vec::new());
        }

        let batches = Batches::find()
            .filter(Column::Id.is_in(batch_ids))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询学员班次失败: {e}")))?;

        Ok(batches.into_iter().map(|m| m.into_batch()).collect())
    }

    pub async fn list_batch_students_impl(&self, batch_id: i64) -> Result<Vec<BatchStudent>> {
        let rows = StudentBatches::find()
            .filter(StudentBatchColumn::BatchId.eq(batch_id))
            .find_also_related(Users)
            .order_by_asc(StudentBatchColumn::JoinedAt)
            .order_by_asc(StudentBatchColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询班次学员失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, user)| {
                user.map(|u| BatchStudent {
                    student_id: link.student_id,
                    username: u.username,
                    display_name: u.display_name,
                    email: u.email,
                    joined_at: crate::entity::ts_to_datetime(link.joined_at),
                })
            })
            .collect())
    }

    pub async fn is_student_enrolled_impl(&self, batch_id: i64, student_id: i64) -> Result<bool> {
        let count = StudentBatches::find()
            .filter(
                Condition::all()
                    .add(StudentBatchColumn::BatchId.eq(batch_id))
                    .add(StudentBatchColumn::StudentId.eq(student_id)),
            )
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询班次学员失败: {e}")))?;

        Ok(count > 0)
    }

    /// 学员加入班次，同时加入班次所属课程
    ///
    /// 两张关联表均幂等写入，返回班次关联是否为新建。
    pub async fn enroll_student_impl(&self, batch_id: i64, student_id: i64) -> Result<bool> {
        let batch = self
            .get_batch_by_id_impl(batch_id)
            .await?
            .ok_or_else(|| LmsError::not_found(format!("班次 {batch_id} 不存在")))?;
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = StudentBatches::find()
            .filter(StudentBatchColumn::BatchId.eq(batch_id))
            .filter(StudentBatchColumn::StudentId.eq(student_id))
            .one(&txn)
            .await?;

        let created = if existing.is_none() {
            StudentBatchActiveModel {
                batch_id: Set(batch_id),
                student_id: Set(student_id),
                joined_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("加入班次失败: {e}")))?;
            true
        } else {
            false
        };

        let enrolled = StudentCourses::find()
            .filter(StudentCourseColumn::CourseId.eq(batch.course_id))
            .filter(StudentCourseColumn::StudentId.eq(student_id))
            .one(&txn)
            .await?;

        if enrolled.is_none() {
            StudentCourseActiveModel {
                course_id: Set(batch.course_id),
                student_id: Set(student_id),
                enrolled_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("选修课程失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(created)
    }

    /// 移出班次，课程选修记录保留
    pub async fn remove_student_impl(&self, batch_id: i64, student_id: i64) -> Result<bool> {
        let result = StudentBatches::delete_many()
            .filter(
                Condition::all()
                    .add(StudentBatchColumn::BatchId.eq(batch_id))
                    .add(StudentBatchColumn::StudentId.eq(student_id)),
            )
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("移出班次失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 按状态统计班次数量
    pub async fn count_batches_by_status_impl(&self) -> Result<Vec<(String, i64)>> {
        Batches::find()
            .select_only()
            .column(Column::Status)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计班次数量失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_enroll_is_idempotent_and_enrols_course() {
        let storage = SeaOrmStorage::in_memory().await;
        let (_, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "stu", UserRole::Student).await;

        assert!(storage.enroll_student_impl(batch.id, student.id).await.unwrap());
        assert!(!storage.enroll_student_impl(batch.id, student.id).await.unwrap());
        assert!(
            storage
                .is_student_enrolled_impl(batch.id, student.id)
                .await
                .unwrap()
        );

        let students = storage.list_batch_students_impl(batch.id).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].username, "stu");

        let courses = StudentCourses::find()
            .filter(StudentCourseColumn::StudentId.eq(student.id))
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(courses, 1);
    }

    #[tokio::test]
    async fn test_list_scoped_by_role() {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "stu", UserRole::Student).await;

        let for_student = storage
            .list_batches_with_pagination_impl(BatchListQuery {
                student_id: Some(student.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_student.pagination.total, 0);

        storage
            .enroll_student_impl(batch.id, student.id)
            .await
            .unwrap();
        let for_student = storage
            .list_batches_with_pagination_impl(BatchListQuery {
                student_id: Some(student.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_student.pagination.total, 1);

        let for_instructor = storage
            .list_batches_with_pagination_impl(BatchListQuery {
                instructor_id: Some(instructor.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_instructor.items[0].id, batch.id);

        assert!(storage.remove_student_impl(batch.id, student.id).await.unwrap());
        assert!(
            storage
                .list_student_batches_impl(student.id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}

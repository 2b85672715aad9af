//! 课程存储操作

use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::student_courses::{Column as StudentCourseColumn, Entity as StudentCourses};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo,
    common::clamp_pagination,
    courses::{
        entities::Course,
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::CourseListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

impl SeaOrmStorage {
    pub async fn create_course_impl(
        &self,
        req: CreateCourseRequest,
        created_by: i64,
    ) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            title: Set(req.title),
            description: Set(req.description),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_course())
    }

    pub async fn get_course_by_id_impl(&self, course_id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(course_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 分页列出课程，指定 student_id 时仅返回其选修的课程
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let (page, size) = clamp_pagination(query.page, query.size);

        let mut select = Courses::find();

        if let Some(student_id) = query.student_id {
            let course_ids: Vec<i64> = StudentCourses::find()
                .select_only()
                .column(StudentCourseColumn::CourseId)
                .filter(StudentCourseColumn::StudentId.eq(student_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;
            select = select.filter(Column::Id.is_in(course_ids));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Title.contains(&escaped));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程页数失败: {e}")))?;
        let courses = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程列表失败: {e}")))?;

        Ok(CourseListResponse {
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
            items: courses.into_iter().map(|m| m.into_course()).collect(),
        })
    }

    pub async fn update_course_impl(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        if self.get_course_by_id_impl(course_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(course_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新课程失败: {e}")))?;

        Ok(Some(updated.into_course()))
    }

    pub async fn delete_course_impl(&self, course_id: i64) -> Result<bool> {
        let result = Courses::delete_by_id(course_id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除课程失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_courses_impl(&self) -> Result<i64> {
        let count = Courses::find()
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计课程数量失败: {e}")))?;

        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;

    #[tokio::test]
    async fn test_student_sees_only_enrolled_courses() {
        let storage = SeaOrmStorage::in_memory().await;
        let (_, batch) = test_support::batch(&storage).await;
        storage
            .create_course_impl(
                CreateCourseRequest {
                    title: "Go 进阶".to_string(),
                    description: None,
                },
                1,
            )
            .await
            .unwrap();
        let student = test_support::user(
            &storage,
            "stu",
            crate::models::users::entities::UserRole::Student,
        )
        .await;
        storage
            .enroll_student_impl(batch.id, student.id)
            .await
            .unwrap();

        let all = storage
            .list_courses_with_pagination_impl(CourseListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);

        let mine = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                student_id: Some(student.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.pagination.total, 1);
        assert_eq!(mine.items[0].id, batch.course_id);
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{
    attendance::entities::{Attendance, AttendanceStatus},
    batches::{
        entities::{Batch, BatchStudent},
        requests::{BatchListQuery, CreateBatchRequest, UpdateBatchRequest},
        responses::BatchListResponse,
    },
    courses::{
        entities::Course,
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::CourseListResponse,
    },
    dashboard::responses::DashboardStats,
    feedback::{entities::BatchFeedback, requests::SubmitFeedbackRequest},
    resources::{entities::Resource, requests::CreateResourceRequest},
    schedules::{
        entities::Schedule,
        requests::{CreateScheduleRequest, UpdateScheduleRequest},
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 资源删除结果
#[derive(Debug, Clone, Default)]
pub struct ResourceDeletion {
    /// 已删除的资源（用于清理磁盘文件）
    pub deleted: Vec<Resource>,
    /// 因区间收缩而删除的反馈条数
    pub pruned_feedback: u64,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段为哈希值）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 课程管理方法
    async fn create_course(&self, course: CreateCourseRequest, created_by: i64) -> Result<Course>;
    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>>;
    async fn delete_course(&self, course_id: i64) -> Result<bool>;

    /// 班次管理方法
    async fn create_batch(&self, batch: CreateBatchRequest) -> Result<Batch>;
    async fn get_batch_by_id(&self, batch_id: i64) -> Result<Option<Batch>>;
    async fn list_batches_with_pagination(&self, query: BatchListQuery)
    -> Result<BatchListResponse>;
    async fn update_batch(&self, batch_id: i64, update: UpdateBatchRequest)
    -> Result<Option<Batch>>;
    async fn delete_batch(&self, batch_id: i64) -> Result<bool>;
    // 列出学员参加的全部班次
    async fn list_student_batches(&self, student_id: i64) -> Result<Vec<Batch>>;

    /// 班次学员方法
    async fn list_batch_students(&self, batch_id: i64) -> Result<Vec<BatchStudent>>;
    async fn is_student_enrolled(&self, batch_id: i64, student_id: i64) -> Result<bool>;
    // 加入班次并同步选修课程，返回是否新加入
    async fn enroll_student(&self, batch_id: i64, student_id: i64) -> Result<bool>;
    async fn remove_student(&self, batch_id: i64, student_id: i64) -> Result<bool>;

    /// 课表管理方法
    async fn create_schedule(
        &self,
        batch_id: i64,
        schedule: CreateScheduleRequest,
        created_by: i64,
    ) -> Result<Schedule>;
    async fn get_schedule_by_id(&self, schedule_id: i64) -> Result<Option<Schedule>>;
    async fn list_batch_schedules(&self, batch_id: i64) -> Result<Vec<Schedule>>;
    async fn update_schedule(
        &self,
        schedule_id: i64,
        update: UpdateScheduleRequest,
    ) -> Result<Option<Schedule>>;
    async fn delete_schedule(&self, schedule_id: i64) -> Result<bool>;
    async fn count_batch_schedules(&self, batch_id: i64) -> Result<i64>;

    /// 出勤方法
    // 标记出勤，同一课表同一用户只保留一条
    async fn upsert_attendance(
        &self,
        schedule_id: i64,
        user_id: i64,
        status: AttendanceStatus,
        marked_by: i64,
    ) -> Result<Attendance>;
    async fn list_schedule_attendance(&self, schedule_id: i64) -> Result<Vec<Attendance>>;
    // 列出班次下所有课表的出勤记录
    async fn list_batch_attendance(&self, batch_id: i64) -> Result<Vec<Attendance>>;
    // 列出某学员在班次内的出勤记录
    async fn list_student_batch_attendance(
        &self,
        batch_id: i64,
        student_id: i64,
    ) -> Result<Vec<Attendance>>;

    /// 资源方法
    async fn create_resource(&self, resource: CreateResourceRequest) -> Result<Resource>;
    async fn get_resource_by_id(&self, resource_id: i64) -> Result<Option<Resource>>;
    async fn list_batch_resources(&self, batch_id: i64) -> Result<Vec<Resource>>;
    async fn count_batch_resources(&self, batch_id: i64) -> Result<i64>;
    // 在同一事务中删除资源并清理超出区间范围的反馈
    async fn delete_resources(&self, batch_id: i64, resource_ids: &[i64])
    -> Result<ResourceDeletion>;

    /// 班次反馈方法
    async fn list_submitted_intervals(&self, batch_id: i64, student_id: i64)
    -> Result<BTreeSet<i64>>;
    // 新建或覆盖反馈，返回 (反馈, 是否新建)
    async fn upsert_feedback(
        &self,
        batch_id: i64,
        student_id: i64,
        feedback: SubmitFeedbackRequest,
    ) -> Result<(BatchFeedback, bool)>;
    async fn list_batch_feedback(
        &self,
        batch_id: i64,
        interval: Option<i64>,
    ) -> Result<Vec<BatchFeedback>>;

    /// 统计方法
    async fn get_dashboard_stats(&self) -> Result<DashboardStats>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}

//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod attendance;
mod batches;
mod courses;
mod dashboard;
mod feedback;
mod resources;
mod schedules;
mod users;

use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Self::from_connection(db).await
    }

    /// 使用已建立的连接创建存储并执行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| LmsError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LmsError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 推断数据库类型
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(LmsError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 测试用内存数据库
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        Self::from_connection(db).await.unwrap()
    }

    /// 测试用文件数据库，多连接池，用于并发写入测试
    #[cfg(test)]
    pub(crate) async fn file_backed(connections: u32) -> Self {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

        let path = std::env::temp_dir().join(format!("lms-test-{}.db", uuid::Uuid::new_v4()));
        let opt = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(connections)
            .connect_with(opt)
            .await
            .unwrap();
        Self::from_connection(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
            .await
            .unwrap()
    }
}

// Storage trait 实现
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
use crate::storage::{ResourceDeletion, Storage};
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 课程模块
    async fn create_course(&self, course: CreateCourseRequest, created_by: i64) -> Result<Course> {
        self.create_course_impl(course, created_by).await
    }

    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(course_id).await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        self.update_course_impl(course_id, update).await
    }

    async fn delete_course(&self, course_id: i64) -> Result<bool> {
        self.delete_course_impl(course_id).await
    }

    // 班次模块
    async fn create_batch(&self, batch: CreateBatchRequest) -> Result<Batch> {
        self.create_batch_impl(batch).await
    }

    async fn get_batch_by_id(&self, batch_id: i64) -> Result<Option<Batch>> {
        self.get_batch_by_id_impl(batch_id).await
    }

    async fn list_batches_with_pagination(
        &self,
        query: BatchListQuery,
    ) -> Result<BatchListResponse> {
        self.list_batches_with_pagination_impl(query).await
    }

    async fn update_batch(
        &self,
        batch_id: i64,
        update: UpdateBatchRequest,
    ) -> Result<Option<Batch>> {
        self.update_batch_impl(batch_id, update).await
    }

    async fn delete_batch(&self, batch_id: i64) -> Result<bool> {
        self.delete_batch_impl(batch_id).await
    }

    async fn list_student_batches(&self, student_id: i64) -> Result<Vec<Batch>> {
        self.list_student_batches_impl(student_id).await
    }

    async fn list_batch_students(&self, batch_id: i64) -> Result<Vec<BatchStudent>> {
        self.list_batch_students_impl(batch_id).await
    }

    async fn is_student_enrolled(&self, batch_id: i64, student_id: i64) -> Result<bool> {
        self.is_student_enrolled_impl(batch_id, student_id).await
    }

    async fn enroll_student(&self, batch_id: i64, student_id: i64) -> Result<bool> {
        self.enroll_student_impl(batch_id, student_id).await
    }

    async fn remove_student(&self, batch_id: i64, student_id: i64) -> Result<bool> {
        self.remove_student_impl(batch_id, student_id).await
    }

    // 课表模块
    async fn create_schedule(
        &self,
        batch_id: i64,
        schedule: CreateScheduleRequest,
        created_by: i64,
    ) -> Result<Schedule> {
        self.create_schedule_impl(batch_id, schedule, created_by)
            .await
    }

    async fn get_schedule_by_id(&self, schedule_id: i64) -> Result<Option<Schedule>> {
        self.get_schedule_by_id_impl(schedule_id).await
    }

    async fn list_batch_schedules(&self, batch_id: i64) -> Result<Vec<Schedule>> {
        self.list_batch_schedules_impl(batch_id).await
    }

    async fn update_schedule(
        &self,
        schedule_id: i64,
        update: UpdateScheduleRequest,
    ) -> Result<Option<Schedule>> {
        self.update_schedule_impl(schedule_id, update).await
    }

    async fn delete_schedule(&self, schedule_id: i64) -> Result<bool> {
        self.delete_schedule_impl(schedule_id).await
    }

    async fn count_batch_schedules(&self, batch_id: i64) -> Result<i64> {
        self.count_batch_schedules_impl(batch_id).await
    }

    // 出勤模块
    async fn upsert_attendance(
        &self,
        schedule_id: i64,
        user_id: i64,
        status: AttendanceStatus,
        marked_by: i64,
    ) -> Result<Attendance> {
        self.upsert_attendance_impl(schedule_id, user_id, status, marked_by)
            .await
    }

    async fn list_schedule_attendance(&self, schedule_id: i64) -> Result<Vec<Attendance>> {
        self.list_schedule_attendance_impl(schedule_id).await
    }

    async fn list_batch_attendance(&self, batch_id: i64) -> Result<Vec<Attendance>> {
        self.list_batch_attendance_impl(batch_id).await
    }

    async fn list_student_batch_attendance(
        &self,
        batch_id: i64,
        student_id: i64,
    ) -> Result<Vec<Attendance>> {
        self.list_student_batch_attendance_impl(batch_id, student_id)
            .await
    }

    // 资源模块
    async fn create_resource(&self, resource: CreateResourceRequest) -> Result<Resource> {
        self.create_resource_impl(resource).await
    }

    async fn get_resource_by_id(&self, resource_id: i64) -> Result<Option<Resource>> {
        self.get_resource_by_id_impl(resource_id).await
    }

    async fn list_batch_resources(&self, batch_id: i64) -> Result<Vec<Resource>> {
        self.list_batch_resources_impl(batch_id).await
    }

    async fn count_batch_resources(&self, batch_id: i64) -> Result<i64> {
        self.count_batch_resources_impl(batch_id).await
    }

    async fn delete_resources(
        &self,
        batch_id: i64,
        resource_ids: &[i64],
    ) -> Result<ResourceDeletion> {
        self.delete_resources_impl(batch_id, resource_ids).await
    }

    // 反馈模块
    async fn list_submitted_intervals(
        &self,
        batch_id: i64,
        student_id: i64,
    ) -> Result<BTreeSet<i64>> {
        self.list_submitted_intervals_impl(batch_id, student_id)
            .await
    }

    async fn upsert_feedback(
        &self,
        batch_id: i64,
        student_id: i64,
        feedback: SubmitFeedbackRequest,
    ) -> Result<(BatchFeedback, bool)> {
        self.upsert_feedback_impl(batch_id, student_id, feedback)
            .await
    }

    async fn list_batch_feedback(
        &self,
        batch_id: i64,
        interval: Option<i64>,
    ) -> Result<Vec<BatchFeedback>> {
        self.list_batch_feedback_impl(batch_id, interval).await
    }

    // 统计模块
    async fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        self.get_dashboard_stats_impl().await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SeaOrmStorage;
    use crate::models::batches::{entities::Batch, requests::CreateBatchRequest};
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::models::users::{entities::{User, UserRole}, requests::CreateUserRequest};

    pub async fn user(storage: &SeaOrmStorage, name: &str, role: UserRole) -> User {
        storage
            .create_user_impl(CreateUserRequest {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password: "hash".to_string(),
                role,
                display_name: None,
                phone: None,
            })
            .await
            .unwrap()
    }

    /// 创建课程与班次，返回 (讲师, 班次)
    pub async fn batch(storage: &SeaOrmStorage) -> (User, Batch) {
        let admin = user(storage, "admin", UserRole::Admin).await;
        let instructor = user(storage, "mentor", UserRole::Instructor).await;
        let course = storage
            .create_course_impl(
                CreateCourseRequest {
                    title: "Rust 入门".to_string(),
                    description: None,
                },
                admin.id,
            )
            .await
            .unwrap();
        let batch = storage
            .create_batch_impl(CreateBatchRequest {
                course_id: course.id,
                instructor_id: instructor.id,
                name: "一期".to_string(),
                start_date: None,
                end_date: None,
                status: None,
            })
            .await
            .unwrap();
        (instructor, batch)
    }
}

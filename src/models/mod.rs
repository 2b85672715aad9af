//! 数据模型定义
//!
//! HTTP 请求/响应结构与业务实体，所有导出类型同时生成前端 TypeScript 定义。

pub mod attendance;
pub mod auth;
pub mod batches;
pub mod common;
pub mod courses;
pub mod dashboard;
pub mod feedback;
pub mod resources;
pub mod schedules;
pub mod users;

pub use common::{
    ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery, RequestContext,
};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

//! 纯业务规则
//!
//! 不依赖数据库与 HTTP，供服务层与存储层共同调用。

pub mod access;
pub mod attendance_stats;
pub mod feedback_gate;

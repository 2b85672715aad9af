use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct UserCounts {
    pub total: i64,
    pub admins: i64,
    pub instructors: i64,
    pub students: i64,
}

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct BatchCounts {
    pub total: i64,
    pub upcoming: i64,
    pub ongoing: i64,
    pub completed: i64,
}

// 管理员仪表盘统计
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DashboardStats {
    pub users: UserCounts,
    pub courses: i64,
    pub batches: BatchCounts,
    pub schedules: i64,
    pub resources: i64,
    pub attendance_percentage: i64,
}

use super::entities::{Attendance, AttendanceStats};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceListResponse {
    pub schedule_id: i64,
    pub items: Vec<Attendance>,
}

// 批量标记中单条记录的结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct BulkAttendanceItemResult {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Attendance>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct BulkAttendanceResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkAttendanceItemResult>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct BatchAttendanceSummary {
    pub batch_id: i64,
    pub batch_name: String,
    #[serde(flatten)]
    #[ts(flatten)]
    pub stats: AttendanceStats,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct StudentAttendanceAnalytics {
    pub student_id: i64,
    pub overall: AttendanceStats,
    pub by_batch: Vec<BatchAttendanceSummary>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct StudentAttendanceSummary {
    pub student_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    #[serde(flatten)]
    #[ts(flatten)]
    pub stats: AttendanceStats,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct BatchAttendanceAnalytics {
    pub batch_id: i64,
    pub batch_name: String,
    pub total_students: i64,
    pub total_classes: i64,
    pub overall: AttendanceStats,
    pub students: Vec<StudentAttendanceSummary>,
}

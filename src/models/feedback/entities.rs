use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub struct BatchFeedback {
    pub id: i64,
    pub batch_id: i64,
    pub student_id: i64,
    pub interval: i64,
    pub rating: i32,
    pub feedback: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 反馈需求判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub struct FeedbackRequirement {
    pub feedback_required: bool,
    pub interval: i64,
    pub missing_interval: Option<i64>,
}

use super::entities::BatchFeedback;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub struct SubmitFeedbackResponse {
    pub feedback: BatchFeedback,
    /// true 表示新建，false 表示覆盖已有反馈
    pub created: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub struct FeedbackListResponse {
    pub batch_id: i64,
    pub items: Vec<BatchFeedback>,
}

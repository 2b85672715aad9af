use super::entities::SequencedResource;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/resource.ts")]
pub struct ResourceListResponse {
    pub batch_id: i64,
    pub total: i64,
    pub interval_count: i64,
    /// 当前学员已解锁到的区间；教职人员为 None
    pub unlocked_through: Option<i64>,
    pub items: Vec<SequencedResource>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/resource.ts")]
pub struct DeleteResourcesResponse {
    pub deleted_ids: Vec<i64>,
    pub pruned_feedback: u64,
}

use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/resource.ts")]
pub struct BulkDeleteResourcesRequest {
    pub resource_ids: Vec<i64>,
}

// 新建资源（由上传处理器构造）
#[derive(Debug, Clone)]
pub struct CreateResourceRequest {
    pub batch_id: i64,
    pub title: String,
    pub resource_type: super::entities::ResourceType,
    pub file_name: String,
    pub stored_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub uploaded_by: i64,
}

use super::entities::{Batch, BatchStudent};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<Batch>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchStudentsResponse {
    pub batch_id: i64,
    pub items: Vec<BatchStudent>,
}

// 批量添加学员结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct AddStudentsResponse {
    pub added: Vec<i64>,
    pub already_enrolled: Vec<i64>,
    pub rejected: Vec<i64>,
}

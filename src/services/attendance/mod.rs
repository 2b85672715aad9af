pub mod analytics;
pub mod list;
pub mod mark;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::attendance::requests::{BulkAttendanceRequest, MarkAttendanceRequest};
use crate::storage::Storage;

pub struct AttendanceService {
    storage: Option<Arc<dyn Storage>>,
}

impl AttendanceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    // 标记单条出勤
    pub async fn mark_attendance(
        &self,
        schedule_id: i64,
        body: MarkAttendanceRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        mark::mark_attendance(self, schedule_id, body, request).await
    }

    // 批量标记出勤
    pub async fn bulk_mark_attendance(
        &self,
        body: BulkAttendanceRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        mark::bulk_mark_attendance(self, body, request).await
    }

    pub async fn list_attendance(
        &self,
        schedule_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_attendance(self, schedule_id, request).await
    }

    // 学员出勤分析
    pub async fn student_analytics(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        analytics::student_analytics(self, student_id, request).await
    }

    // 班次出勤分析
    pub async fn batch_analytics(
        &self,
        batch_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        analytics::batch_analytics(self, batch_id, request).await
    }
}

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod students;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::batches::requests::{
    AddStudentsRequest, BatchQueryParams, CreateBatchRequest, UpdateBatchRequest,
};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::storage::Storage;

pub struct BatchService {
    storage: Option<Arc<dyn Storage>>,
}

impl BatchService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    pub async fn list_batches(
        &self,
        query: BatchQueryParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_batches(self, query, request).await
    }

    pub async fn get_batch(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_batch(request).await
    }

    pub async fn create_batch(
        &self,
        batch: CreateBatchRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_batch(self, batch, request).await
    }

    pub async fn update_batch(
        &self,
        batch_id: i64,
        update: UpdateBatchRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_batch(self, batch_id, update, request).await
    }

    pub async fn delete_batch(
        &self,
        batch_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_batch(self, batch_id, request).await
    }

    pub async fn list_students(
        &self,
        batch_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        students::list_students(self, batch_id, request).await
    }

    pub async fn add_students(
        &self,
        batch_id: i64,
        body: AddStudentsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        students::add_students(self, batch_id, body, request).await
    }

    pub async fn remove_student(
        &self,
        batch_id: i64,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        students::remove_student(self, batch_id, student_id, request).await
    }
}

// 指定的讲师必须存在且角色为讲师
pub(crate) async fn check_instructor(
    storage: &Arc<dyn Storage>,
    instructor_id: i64,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_id(instructor_id).await {
        Ok(Some(user)) if user.role == UserRole::Instructor => Ok(()),
        Ok(Some(_)) => Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            "Assigned user is not an instructor",
        ))),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "Instructor not found",
        ))),
        Err(e) => Err(internal_error("Load instructor", &e)),
    }
}

// 起止日期都给出时，结束日期不得早于开始日期
pub(crate) fn check_date_range(
    start: Option<chrono::DateTime<chrono::Utc>>,
    end: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<(), &'static str> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err("End date must not be before start date"),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_check_date_range() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        assert!(check_date_range(Some(start), Some(end)).is_ok());
        assert!(check_date_range(Some(start), Some(start)).is_ok());
        assert!(check_date_range(Some(end), Some(start)).is_err());
        assert!(check_date_range(None, Some(start)).is_ok());
    }
}

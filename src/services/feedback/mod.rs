pub mod list;
pub mod required;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::feedback::requests::{FeedbackQueryParams, SubmitFeedbackRequest};
use crate::storage::Storage;

pub struct FeedbackService {
    storage: Option<Arc<dyn Storage>>,
}

impl FeedbackService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    // 当前学员是否需要提交反馈
    pub async fn get_requirement(
        &self,
        batch_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        required::get_requirement(self, batch_id, request).await
    }

    pub async fn submit_feedback(
        &self,
        batch_id: i64,
        body: SubmitFeedbackRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_feedback(self, batch_id, body, request).await
    }

    pub async fn list_feedback(
        &self,
        batch_id: i64,
        query: FeedbackQueryParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_feedback(self, batch_id, query, request).await
    }
}

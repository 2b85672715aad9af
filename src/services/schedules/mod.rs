pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::domain::access;
use crate::models::batches::entities::Batch;
use crate::models::schedules::entities::Schedule;
use crate::models::schedules::requests::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::models::{ErrorCode, RequestContext};
use crate::services::Rejection;
use crate::storage::Storage;

pub struct ScheduleService {
    storage: Option<Arc<dyn Storage>>,
}

impl ScheduleService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    pub async fn list_schedules(
        &self,
        batch_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_schedules(self, batch_id, request).await
    }

    pub async fn create_schedule(
        &self,
        batch_id: i64,
        schedule: CreateScheduleRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_schedule(self, batch_id, schedule, request).await
    }

    pub async fn update_schedule(
        &self,
        schedule_id: i64,
        update: UpdateScheduleRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_schedule(self, schedule_id, update, request).await
    }

    pub async fn delete_schedule(
        &self,
        schedule_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_schedule(self, schedule_id, request).await
    }
}

/// 加载课表及其班次，并要求调用者可以管理该班次
pub(crate) async fn load_managed_schedule(
    storage: &Arc<dyn Storage>,
    ctx: &RequestContext,
    schedule_id: i64,
) -> Result<(Schedule, Batch), Rejection> {
    let schedule = storage
        .get_schedule_by_id(schedule_id)
        .await
        .map_err(|e| Rejection::internal("Load schedule", &e))?
        .ok_or_else(|| Rejection::not_found(ErrorCode::ScheduleNotFound, "Schedule not found"))?;

    let batch = storage
        .get_batch_by_id(schedule.batch_id)
        .await
        .map_err(|e| Rejection::internal("Load batch", &e))?
        .ok_or_else(|| Rejection::not_found(ErrorCode::BatchNotFound, "Batch not found"))?;

    if !access::can_manage_batch(ctx, &batch) {
        return Err(Rejection::forbidden(
            ErrorCode::BatchPermissionDenied,
            "No permission for this batch",
        ));
    }

    Ok((schedule, batch))
}

pub mod delete;
pub mod download;
pub mod list;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::feedback_gate;
use crate::models::RequestContext;
use crate::models::resources::entities::Resource;
use crate::models::resources::requests::BulkDeleteResourcesRequest;
use crate::services::Rejection;
use crate::storage::Storage;

pub struct ResourceService {
    storage: Option<Arc<dyn Storage>>,
}

impl ResourceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    pub async fn upload_resource(
        &self,
        batch_id: i64,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_upload(self, batch_id, request, payload).await
    }

    pub async fn list_resources(
        &self,
        batch_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_resources(self, batch_id, request).await
    }

    pub async fn download_resource(
        &self,
        resource_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        download::handle_download(self, resource_id, request).await
    }

    pub async fn delete_resource(
        &self,
        resource_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_resource(self, resource_id, request).await
    }

    pub async fn bulk_delete_resources(
        &self,
        batch_id: i64,
        body: BulkDeleteResourcesRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::bulk_delete_resources(self, batch_id, body, request).await
    }
}

/// 资源文件在磁盘上的位置
pub(crate) fn stored_path(stored_name: &str) -> PathBuf {
    PathBuf::from(&AppConfig::get().upload.dir).join(stored_name)
}

/// 删除资源对应的文件，失败只记录日志
pub(crate) async fn remove_stored_files(resources: &[Resource]) {
    for resource in resources {
        let path = stored_path(&resource.stored_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove file {}: {}", path.display(), e);
        }
    }
}

/// 学员在班次内已解锁到的区间，非学员返回 None（不受锁定限制）
pub(crate) async fn unlocked_through_for(
    storage: &Arc<dyn Storage>,
    ctx: &RequestContext,
    batch_id: i64,
) -> Result<Option<i64>, Rejection> {
    if !ctx.is_student() {
        return Ok(None);
    }
    let submitted = storage
        .list_submitted_intervals(batch_id, ctx.user_id)
        .await
        .map_err(|e| Rejection::internal("Load submitted feedback", &e))?;
    Ok(Some(feedback_gate::unlocked_through(&submitted)))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::resources::{entities::ResourceType, requests::CreateResourceRequest};
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, test_support};
    use actix_web::{HttpMessage, test::TestRequest, web};

    pub struct Fixture {
        pub storage: Arc<dyn Storage>,
        pub batch_id: i64,
        pub instructor_id: i64,
        pub student_id: i64,
        pub outsider_id: i64,
        pub resources: Vec<Resource>,
    }

    /// 一个班次、一名已加入学员、一名未加入学员、`count` 份资源
    pub async fn setup(count: usize) -> Fixture {
        let storage = SeaOrmStorage::in_memory().await;
        let (instructor, batch) = test_support::batch(&storage).await;
        let student = test_support::user(&storage, "alice", UserRole::Student).await;
        let outsider = test_support::user(&storage, "eve", UserRole::Student).await;
        storage.enroll_student_impl(batch.id, student.id).await.unwrap();

        let mut resources = Vec::with_capacity(count);
        for i in 0..count {
            let resource = storage
                .create_resource_impl(CreateResourceRequest {
                    batch_id: batch.id,
                    title: format!("第 {} 讲", i + 1),
                    resource_type: ResourceType::Assignment,
                    file_name: format!("lecture-{i}.txt"),
                    stored_name: format!("{}.txt", uuid::Uuid::new_v4()),
                    file_size: 5,
                    content_type: "text/plain".to_string(),
                    uploaded_by: instructor.id,
                })
                .await
                .unwrap();
            resources.push(resource);
        }

        Fixture {
            storage: Arc::new(storage),
            batch_id: batch.id,
            instructor_id: instructor.id,
            student_id: student.id,
            outsider_id: outsider.id,
            resources,
        }
    }

    pub fn request(storage: &Arc<dyn Storage>, ctx: RequestContext) -> HttpRequest {
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        req.extensions_mut().insert(ctx);
        req
    }

    pub async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// 把资源内容写到上传目录
    pub async fn write_file(resource: &Resource, content: &[u8]) {
        tokio::fs::create_dir_all(&AppConfig::get().upload.dir)
            .await
            .unwrap();
        tokio::fs::write(stored_path(&resource.stored_name), content)
            .await
            .unwrap();
    }
}

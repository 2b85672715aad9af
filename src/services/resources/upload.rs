use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::{StreamExt, TryStreamExt};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{ResourceService, stored_path};
use crate::config::AppConfig;
use crate::models::resources::{entities::ResourceType, requests::CreateResourceRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, internal_error, require_context};
use crate::utils::validate::validate_title;
use crate::utils::validate_magic_bytes;

/// 已写入磁盘、尚未入库的文件
struct StagedFile {
    original_name: String,
    stored_name: String,
    size: i64,
    content_type: String,
}

// 小写扩展名，含点号
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

async fn discard(stored_name: &str) {
    let _ = tokio::fs::remove_file(stored_path(stored_name)).await;
}

/// 读取一个文本字段
async fn read_text(field: &mut actix_multipart::Field) -> ActixResult<String> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        bytes.extend_from_slice(&chunk?);
        if bytes.len() > 4096 {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// 把文件字段写入上传目录，边写边校验魔术字节与大小
async fn stage_file(
    field: &mut actix_multipart::Field,
    original_name: String,
    allowed_types: &[String],
    max_size: usize,
) -> ActixResult<Result<StagedFile, Rejection>> {
    let extension = extension_of(&original_name);
    if !allowed_types.iter().any(|t| t.to_lowercase() == extension) {
        return Ok(Err(Rejection::bad_request(
            ErrorCode::FileTypeNotAllowed,
            "File type not allowed",
        )));
    }

    let content_type = field
        .content_type()
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let stored_name = format!("{}{}", Uuid::new_v4(), extension);
    let mut file = match tokio::fs::File::create(stored_path(&stored_name)).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("Failed to create upload file: {}", e);
            return Ok(Err(Rejection::new(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::FileUploadFailed,
                "Failed to create file",
            )));
        }
    };

    let mut total_size: usize = 0;
    let mut first_chunk = true;
    while let Some(chunk) = field.next().await {
        let data = match chunk {
            Ok(data) => data,
            Err(e) => {
                discard(&stored_name).await;
                return Err(e.into());
            }
        };

        if first_chunk {
            first_chunk = false;
            if !validate_magic_bytes(&data, &extension) {
                discard(&stored_name).await;
                return Ok(Err(Rejection::bad_request(
                    ErrorCode::FileTypeNotAllowed,
                    "File content does not match its extension",
                )));
            }
        }

        total_size += data.len();
        if total_size > max_size {
            discard(&stored_name).await;
            return Ok(Err(Rejection::bad_request(
                ErrorCode::FileSizeExceeded,
                "File size exceeds the limit",
            )));
        }

        if let Err(e) = file.write_all(&data).await {
            tracing::error!("Failed to write upload file: {}", e);
            discard(&stored_name).await;
            return Ok(Err(Rejection::new(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::FileUploadFailed,
                "Failed to write file",
            )));
        }
    }

    if total_size == 0 {
        discard(&stored_name).await;
        return Ok(Err(Rejection::bad_request(
            ErrorCode::FileNotFound,
            "Uploaded file is empty",
        )));
    }
    if let Err(e) = file.flush().await {
        tracing::warn!("Failed to flush upload file: {}", e);
    }

    Ok(Ok(StagedFile {
        original_name,
        stored_name,
        size: total_size as i64,
        content_type,
    }))
}

/// 上传班次资源
///
/// 表单字段：`file`（必填，仅一个）、`resource_type`（assignment | recording）、`title`（缺省为文件名）。
pub async fn handle_upload(
    service: &ResourceService,
    batch_id: i64,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let ctx = require_context(request)?;
    let config = AppConfig::get();

    if let Err(e) = tokio::fs::create_dir_all(&config.upload.dir).await {
        tracing::error!("Failed to create upload dir {}: {}", config.upload.dir, e);
        return Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::FileUploadFailed,
                "Failed to create upload directory",
            )),
        );
    }

    let mut staged: Option<StagedFile> = None;
    let mut title: Option<String> = None;
    let mut resource_type: Option<String> = None;
    let mut rejection: Option<Rejection> = None;

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        match name.as_str() {
            "file" => {
                if staged.is_some() {
                    rejection = Some(Rejection::bad_request(
                        ErrorCode::MultifileUploadNotAllowed,
                        "Only one file can be uploaded at a time",
                    ));
                    break;
                }
                let original_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                match stage_file(
                    &mut field,
                    original_name,
                    &config.upload.allowed_types,
                    config.upload.max_size,
                )
                .await?
                {
                    Ok(file) => staged = Some(file),
                    Err(r) => {
                        rejection = Some(r);
                        break;
                    }
                }
            }
            "title" => title = Some(read_text(&mut field).await?),
            "resource_type" => resource_type = Some(read_text(&mut field).await?),
            _ => {
                // 丢弃未知字段
                while field.next().await.is_some() {}
            }
        }
    }

    if let Some(rejection) = rejection {
        if let Some(file) = staged {
            discard(&file.stored_name).await;
        }
        return Ok(rejection.into_response());
    }

    let Some(file) = staged else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::FileNotFound,
            "No file found in upload payload",
        )));
    };

    let resource_type = match resource_type.as_deref().map(str::parse::<ResourceType>) {
        Some(Ok(kind)) => kind,
        _ => {
            discard(&file.stored_name).await;
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ValidationFailed,
                "resource_type must be assignment or recording",
            )));
        }
    };

    let title = title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file.original_name.clone());
    if let Err(msg) = validate_title(&title) {
        discard(&file.stored_name).await;
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    let storage = service.get_storage(request)?;
    let create = CreateResourceRequest {
        batch_id,
        title,
        resource_type,
        file_name: file.original_name,
        stored_name: file.stored_name.clone(),
        file_size: file.size,
        content_type: file.content_type,
        uploaded_by: ctx.user_id,
    };

    match storage.create_resource(create).await {
        Ok(resource) => {
            tracing::info!(
                "Resource {} uploaded to batch {} by {}",
                resource.id,
                batch_id,
                ctx.user_id
            );
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(resource, "Resource uploaded successfully")))
        }
        Err(e) => {
            discard(&file.stored_name).await;
            Ok(internal_error("Upload resource", &e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Lecture 01.MP4"), ".mp4");
        assert_eq!(extension_of("notes.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
    }
}

use crate::{
    auth::CallerIdentity,
    error::AppError,
    models::{AppState, DeleteRequest, MessageResponse, NewVideo, VideoRecord},
};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::header::CONTENT_TYPE,
    response::{Html, Json},
};
use multer::{Constraints, Multipart, SizeLimit};
use std::{sync::Arc, time::Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

const UPLOAD_FAILED: &str = "Upload video failed";
const DELETE_FAILED: &str = "Delete video failed";
const MISSING_CREDENTIALS: &str = "Cloudinary credentials not found";

/// Limit for each non-file form field
const TEXT_FIELD_LIMIT: u64 = 64 * 1024;
/// Room for boundaries, headers and text fields on top of the file itself
const FORM_OVERHEAD: u64 = 1024 * 1024;

static UPLOAD_PAGE: &str = include_str!("../assets/video-upload.html");

/// Fields of the upload form
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Bytes)>,
    title: Option<String>,
    description: Option<String>,
    original_size: Option<String>,
}

/// Upload a video to the media host and record its metadata
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    request: Request<Body>,
) -> Result<Json<VideoRecord>, AppError> {
    let start_time = Instant::now();

    let media = state
        .media
        .clone()
        .ok_or(AppError::Configuration(MISSING_CREDENTIALS))?;

    let form = read_upload_form(request, state.config.max_file_size).await?;

    let (file_name, file_bytes) = form.file.ok_or(AppError::Validation("File not found"))?;
    let title = form.title.ok_or(AppError::Validation("Title is required"))?;

    let file_size_mb = file_bytes.len() as f64 / 1024.0 / 1024.0;
    info!("[POST /api/video-upload] ⏱️  START - user {}", caller.user_id);
    info!("[POST /api/video-upload] 📁 File: {}", file_name);
    info!(
        "[POST /api/video-upload] 📦 Size: {:.2} MB ({} bytes)",
        file_size_mb,
        file_bytes.len()
    );

    let asset = media
        .upload_video(&file_name, file_bytes)
        .await
        .map_err(|source| AppError::Upstream {
            message: UPLOAD_FAILED,
            source,
        })?;

    info!("[POST /api/video-upload] 💾 Saving {} to database", asset.public_id);

    let new_video = NewVideo {
        title,
        description: form.description,
        public_id: asset.public_id.clone(),
        original_size: form.original_size.unwrap_or_else(|| "0".to_string()),
        compressed_size: asset.bytes.to_string(),
        duration: asset.duration.unwrap_or(0.0),
    };

    let video = state.store.create(new_video).await.map_err(|source| {
        error!(
            "[POST /api/video-upload] ❌ Asset {} is stored remotely but has no record",
            asset.public_id
        );
        AppError::Persistence {
            message: UPLOAD_FAILED,
            source,
        }
    })?;

    info!(
        "[POST /api/video-upload] ✅ SUCCESS - Video ID: {} in {:.2}s",
        video.id,
        start_time.elapsed().as_secs_f64()
    );

    Ok(Json(video))
}

async fn read_upload_form(request: Request<Body>, max_file_size: u64) -> Result<UploadForm, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Validation("Invalid multipart request"))?;

    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        warn!("Failed to parse boundary: {}", e);
        AppError::Validation("Invalid multipart request")
    })?;

    let constraints = Constraints::new().size_limit(
        SizeLimit::new()
            .whole_stream(max_file_size + FORM_OVERHEAD)
            .per_field(TEXT_FIELD_LIMIT)
            .for_field("file", max_file_size),
    );
    let mut multipart = Multipart::with_constraints(
        request.into_body().into_data_stream(),
        boundary,
        constraints,
    );

    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("video.mp4").to_string();
                let data = field.bytes().await.map_err(|e| multipart_error(e, max_file_size))?;

                // An empty file input still submits a zero-length part
                if !data.is_empty() {
                    form.file = Some((file_name, data));
                }
            }
            "title" | "description" | "originalSize" => {
                let value = field.text().await.map_err(|e| multipart_error(e, max_file_size))?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match name.as_str() {
                    "title" => form.title = value,
                    "description" => form.description = value,
                    _ => form.original_size = value,
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: multer::Error, max_file_size: u64) -> AppError {
    match err {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            warn!("Upload rejected: {}", err);
            AppError::PayloadTooLarge(format!(
                "File size too large (Max: {}MB)",
                max_file_size / 1024 / 1024
            ))
        }
        other => {
            warn!("Multipart parsing error: {}", other);
            AppError::Validation("Invalid multipart request")
        }
    }
}

/// Delete a video from the media host, then its record
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let video_id = serde_json::from_slice::<DeleteRequest>(&body)
        .ok()
        .and_then(|request| request.video_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(AppError::Validation("Video ID required"))?;

    info!("[DELETE /api/video-upload] 🗑️  {} requested by {}", video_id, caller.user_id);

    // Ids are generated as UUIDs, anything else cannot exist
    let video = match Uuid::parse_str(&video_id) {
        Ok(id) => state.store.find(id).await.map_err(|source| AppError::Persistence {
            message: DELETE_FAILED,
            source,
        })?,
        Err(_) => None,
    }
    .ok_or(AppError::NotFound("Video not found"))?;

    let media = state
        .media
        .as_ref()
        .ok_or(AppError::Configuration(MISSING_CREDENTIALS))?;

    info!("[DELETE /api/video-upload] Deleting {} from Cloudinary", video.public_id);
    media
        .destroy_video(&video.public_id)
        .await
        .map_err(|source| AppError::Upstream {
            message: DELETE_FAILED,
            source,
        })?;

    info!("[DELETE /api/video-upload] Deleting {} from database", video.id);
    state.store.delete(video.id).await.map_err(|source| {
        error!(
            "[DELETE /api/video-upload] ❌ Asset {} was removed but record {} remains",
            video.public_id, video.id
        );
        AppError::Persistence {
            message: DELETE_FAILED,
            source,
        }
    })?;

    info!("[DELETE /api/video-upload] ✅ SUCCESS - {}", video.id);

    Ok(Json(MessageResponse {
        message: "Video deleted successfully".to_string(),
    }))
}

/// Confirm the database answers a trivial query
pub async fn keep_alive_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .store
        .ping()
        .await
        .map_err(|source| AppError::Persistence {
            message: "Failed to keep DB alive",
            source,
        })?;

    Ok(Json(MessageResponse {
        message: "Database is alive".to_string(),
    }))
}

pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

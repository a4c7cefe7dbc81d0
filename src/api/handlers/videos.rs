use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::{current_user, declared_length, multipart_error};
use crate::models::{NewVideo, UploadRequest, Video};
use crate::services::ingest::IngestOutcome;
use crate::services::videos::{find_owned_video, sign_video};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart field carrying the video file.
pub const VIDEO_FIELD: &str = "video";

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct VideoUploadForm {
    #[schema(value_type = String, format = Binary)]
    video: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/videos",
    request_body = NewVideo,
    responses(
        (status = 201, description = "Draft video created", body = Video),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn create_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NewVideo>,
) -> Result<(StatusCode, Json<Video>), AppError> {
    let user_id = current_user(&claims)?;
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }

    let video = state.videos.create_video(user_id, payload).await?;
    tracing::info!("Created video {} for user {}", video.id, user_id);
    Ok((StatusCode::CREATED, Json(video)))
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video with a presigned video URL", body = Video),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<Uuid>,
) -> Result<Json<Video>, AppError> {
    let user_id = current_user(&claims)?;
    let video = find_owned_video(state.videos.as_ref(), video_id, user_id).await?;
    let signed = sign_video(state.storage.as_ref(), video, state.config.presign_ttl).await?;
    Ok(Json(signed))
}

#[utoipa::path(
    post,
    path = "/api/videos/{id}/upload",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = VideoUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video ingested", body = Video),
        (status = 400, description = "Missing or malformed upload"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Upload too large"),
        (status = 415, description = "Unsupported media type")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Video>, AppError> {
    let user_id = current_user(&claims)?;

    // 1. Ownership is settled before a single body byte is read
    let mut video = find_owned_video(state.videos.as_ref(), video_id, user_id).await?;
    tracing::info!("Uploading video {} by user {}", video_id, user_id);

    // 2. Stream the `video` field through the pipeline
    let mut outcome: Option<IngestOutcome> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let reader = StreamReader::new(field.map_err(std::io::Error::other));
        let request = UploadRequest {
            body: reader,
            content_type,
            video_id,
            user_id,
            declared_size: declared_length(&headers),
        };
        outcome = Some(state.ingest.ingest(request).await?);
        break;
    }

    let outcome = outcome.ok_or_else(|| {
        AppError::BadRequest(format!(
            "Missing required '{}' file in form-data",
            VIDEO_FIELD
        ))
    })?;

    // 3. Persist the composite reference, then answer with a playable URL
    video.video_url = Some(outcome.reference.to_string());
    let video = state.videos.update_video(video).await?;
    let signed = sign_video(state.storage.as_ref(), video, state.config.presign_ttl).await?;

    Ok(Json(signed))
}

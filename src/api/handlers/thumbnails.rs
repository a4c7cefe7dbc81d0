use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::{current_user, declared_length, multipart_error};
use crate::models::Video;
use crate::services::videos::find_owned_video;
use crate::utils::auth::Claims;
use crate::utils::validation::{parse_content_type, resolve_extension, validate_declared_size};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::HeaderMap,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ThumbnailUploadForm {
    #[schema(value_type = String, format = Binary)]
    thumbnail: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{id}",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = ThumbnailUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = Video),
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
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Video>, AppError> {
    let user_id = current_user(&claims)?;
    let max_size = state.config.max_thumbnail_size;
    validate_declared_size(declared_length(&headers), max_size)?;

    let video = find_owned_video(state.videos.as_ref(), video_id, user_id).await?;
    tracing::info!("Uploading thumbnail for video {} by user {}", video_id, user_id);

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let mime_type = parse_content_type(field.content_type().unwrap_or_default())?;
        let extension =
            resolve_extension(&state.config.allowed_thumbnail_types, &mime_type)?.to_string();
        let reader = StreamReader::new(field.map_err(std::io::Error::other));

        let videos = state.videos.clone();
        let updated = state
            .assets
            .add(reader, &extension, &mime_type, user_id, max_size, |asset| {
                let mut video = video;
                video.thumbnail_url = Some(asset.url);
                async move { videos.update_video(video).await }
            })
            .await?;

        return Ok(Json(updated));
    }

    Err(AppError::BadRequest(format!(
        "Missing required '{}' file in form-data",
        THUMBNAIL_FIELD
    )))
}

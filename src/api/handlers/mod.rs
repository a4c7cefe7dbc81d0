pub mod health;
pub mod thumbnails;
pub mod videos;

use crate::api::error::AppError;
use crate::utils::auth::Claims;
use axum::extract::multipart::MultipartError;
use uuid::Uuid;

pub(crate) fn current_user(claims: &Claims) -> Result<Uuid, AppError> {
    claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Couldn't validate JWT".to_string()))
}

pub(crate) fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

/// Content-Length of the whole request, if the client sent one.
pub(crate) fn declared_length(headers: &axum::http::HeaderMap) -> Option<u64> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

use crate::AppState;
use crate::utils::auth::validate_jwt;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Requires a valid `Authorization: Bearer <jwt>` header and stores the
/// decoded `Claims` in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());

    if let Some(token) = token {
        match validate_jwt(&token, &state.config.jwt_secret) {
            // Subjects must be user ids; anything else cannot own a video
            Ok(claims) if claims.user_id().is_some() => {
                req.extensions_mut().insert(claims);
                return Ok(next.run(req).await);
            }
            Ok(claims) => tracing::warn!("Rejected token with non-uuid subject '{}'", claims.sub),
            Err(e) => tracing::debug!("Rejected bearer token: {}", e),
        }
    }

    Err(StatusCode::UNAUTHORIZED)
}

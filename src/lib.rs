pub mod api;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::IngestConfig;
use crate::services::assets::{ASSETS_ROUTE, AssetStore};
use crate::services::ingest::IngestService;
use crate::services::storage::StorageService;
use crate::services::videos::VideoRepository;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Headroom on top of the file ceiling for multipart boundaries and headers.
const MULTIPART_OVERHEAD: u64 = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::videos::create_video,
        api::handlers::videos::get_video,
        api::handlers::videos::upload_video,
        api::handlers::thumbnails::upload_thumbnail,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::Video,
            models::NewVideo,
            models::GeometryInfo,
            models::AspectLabel,
            models::StorageObjectRef,
            services::assets::AssetFile,
            api::handlers::videos::VideoUploadForm,
            api::handlers::thumbnails::ThumbnailUploadForm,
            api::handlers::health::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "videos", description = "Video and thumbnail ingestion endpoints"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IngestConfig>,
    pub storage: Arc<dyn StorageService>,
    pub videos: Arc<dyn VideoRepository>,
    pub ingest: Arc<IngestService>,
    pub assets: Arc<AssetStore>,
}

fn body_limit(max_file_size: u64) -> DefaultBodyLimit {
    let limit = max_file_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

pub fn create_app(state: AppState) -> Router {
    let assets_dir = ServeDir::new(state.assets.root());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .nest_service(&format!("/{}", ASSETS_ROUTE), assets_dir)
        .route(
            "/api/videos",
            post(api::handlers::videos::create_video).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/api/videos/:id",
            get(api::handlers::videos::get_video).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/api/videos/:id/upload",
            post(api::handlers::videos::upload_video)
                .layer(body_limit(state.config.max_video_size))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/api/thumbnail_upload/:id",
            post(api::handlers::thumbnails::upload_thumbnail)
                .layer(body_limit(state.config.max_thumbnail_size))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}

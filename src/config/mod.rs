use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Upload limits, allow-lists and tool locations for the ingestion pipeline
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum video size in bytes (default: 1 GB)
    pub max_video_size: u64,

    /// Maximum thumbnail size in bytes (default: 10 MB)
    pub max_thumbnail_size: u64,

    /// Accepted video content types mapped to the stored file extension
    pub allowed_video_types: HashMap<String, String>,

    /// Accepted thumbnail content types mapped to the stored file extension
    pub allowed_thumbnail_types: HashMap<String, String>,

    /// Validity window of presigned video URLs (default: 1 hour)
    pub presign_ttl: Duration,

    /// Directory used for staged uploads (default: OS temp dir)
    pub staging_dir: PathBuf,

    /// Directory thumbnails are written to (default: "./assets")
    pub assets_root: PathBuf,

    /// Base URL thumbnails are served from
    pub public_base_url: String,

    /// ffmpeg executable (default: "ffmpeg")
    pub ffmpeg_bin: String,

    /// ffprobe executable (default: "ffprobe")
    pub ffprobe_bin: String,

    /// JWT Secret Key
    pub jwt_secret: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_video_size: 1 << 30,     // 1 GB
            max_thumbnail_size: 10 << 20, // 10 MB
            allowed_video_types: type_map(&[("video/mp4", "mp4")]),
            allowed_thumbnail_types: type_map(&[("image/jpeg", "jpg"), ("image/png", "png")]),
            presign_ttl: Duration::from_secs(3600),
            staging_dir: env::temp_dir(),
            assets_root: PathBuf::from("./assets"),
            public_base_url: "http://localhost:8091".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            jwt_secret: "secret".to_string(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_video_size: env::var("MAX_VIDEO_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_video_size),

            max_thumbnail_size: env::var("MAX_THUMBNAIL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_thumbnail_size),

            allowed_video_types: env::var("ALLOWED_VIDEO_TYPES")
                .ok()
                .map(|v| parse_type_map(&v))
                .filter(|m| !m.is_empty())
                .unwrap_or(default.allowed_video_types),

            allowed_thumbnail_types: env::var("ALLOWED_THUMBNAIL_TYPES")
                .ok()
                .map(|v| parse_type_map(&v))
                .filter(|m| !m.is_empty())
                .unwrap_or(default.allowed_thumbnail_types),

            presign_ttl: env::var("PRESIGN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.presign_ttl),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.assets_root),

            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or(default.public_base_url),

            ffmpeg_bin: env::var("FFMPEG_BIN").unwrap_or(default.ffmpeg_bin),

            ffprobe_bin: env::var("FFPROBE_BIN").unwrap_or(default.ffprobe_bin),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),
        }
    }

    /// Create config for development (small limits, local directories)
    pub fn development() -> Self {
        Self {
            max_video_size: 256 << 20,
            staging_dir: PathBuf::from("./tmp"),
            ..Self::default()
        }
    }
}

/// Object store connection settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint, e.g. a local MinIO
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl StorageConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bucket: env::var("S3_BUCKET").map_err(|_| anyhow::anyhow!("S3_BUCKET must be set"))?,
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint: env::var("S3_ENDPOINT").ok(),
            access_key: env::var("S3_ACCESS_KEY").ok(),
            secret_key: env::var("S3_SECRET_KEY").ok(),
        })
    }
}

fn type_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(t, ext)| (t.to_string(), ext.to_string()))
        .collect()
}

/// Parses `type=ext,type=ext` into an allow-list. Malformed entries are skipped.
pub fn parse_type_map(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (content_type, ext) = entry.split_once('=')?;
            let content_type = content_type.trim().to_lowercase();
            let ext = ext.trim().trim_start_matches('.').to_lowercase();
            if content_type.is_empty() || ext.is_empty() {
                tracing::warn!("Ignoring malformed allow-list entry '{}'", entry);
                return None;
            }
            Some((content_type, ext))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.max_video_size, 1024 * 1024 * 1024);
        assert_eq!(config.max_thumbnail_size, 10 * 1024 * 1024);
        assert_eq!(config.allowed_video_types.get("video/mp4").unwrap(), "mp4");
        assert_eq!(config.allowed_thumbnail_types.get("image/png").unwrap(), "png");
        assert!(!config.allowed_video_types.contains_key("application/pdf"));
        assert_eq!(config.presign_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_development_config() {
        let config = IngestConfig::development();
        assert_eq!(config.max_video_size, 256 * 1024 * 1024);
        assert_eq!(config.staging_dir, PathBuf::from("./tmp"));
        assert_eq!(config.ffmpeg_bin, "ffmpeg");
    }

    #[test]
    fn test_parse_type_map() {
        let map = parse_type_map("video/mp4=mp4, Video/QuickTime=.MOV,broken,=x,y=");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("video/mp4").unwrap(), "mp4");
        assert_eq!(map.get("video/quicktime").unwrap(), "mov");
    }
}

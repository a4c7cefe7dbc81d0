use crate::error::IngestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Pixel dimensions of the first video stream of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GeometryInfo {
    pub width: u32,
    pub height: u32,
}

/// Aspect ratio family, used as the namespace prefix of stored video keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectLabel {
    Landscape,
    Portrait,
    Other,
}

impl AspectLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectLabel::Landscape => "landscape",
            AspectLabel::Portrait => "portrait",
            AspectLabel::Other => "other",
        }
    }
}

impl fmt::Display for AspectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single video upload handed over by the HTTP layer.
pub struct UploadRequest<R> {
    pub body: R,
    pub content_type: String,
    pub video_id: Uuid,
    pub user_id: Uuid,
    /// Size announced by the client, checked before any byte is staged.
    pub declared_size: Option<u64>,
}

/// Location of an object written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StorageObjectRef {
    pub bucket: String,
    pub region: String,
    pub key: String,
}

impl StorageObjectRef {
    pub fn reference(&self) -> Result<AssetReference, IngestError> {
        AssetReference::new(&self.bucket, &self.key)
    }
}

/// The `<bucket>,<key>` pair persisted in a video record's URL field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    bucket: String,
    key: String,
}

impl AssetReference {
    pub fn new(bucket: &str, key: &str) -> Result<Self, IngestError> {
        if bucket.is_empty() || key.is_empty() {
            return Err(IngestError::InvalidInput(
                "reference components must not be empty".to_string(),
            ));
        }
        if bucket.contains(',') || key.contains(',') {
            return Err(IngestError::InvalidInput(
                "reference components must not contain ','".to_string(),
            ));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

impl FromStr for AssetReference {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        match parts.as_slice() {
            [bucket, key] => Self::new(bucket, key),
            _ => Err(IngestError::InvalidInput(format!(
                "unexpected video reference format: expected 2 components, found {}",
                parts.len()
            ))),
        }
    }
}

/// Video record owned by the metadata collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Holds an `AssetReference` once a video has been ingested.
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_round_trip() {
        let reference = AssetReference::new("tubely-videos", "landscape/abc_-1.mp4").unwrap();
        let encoded = reference.to_string();
        assert_eq!(encoded, "tubely-videos,landscape/abc_-1.mp4");

        let parsed: AssetReference = encoded.parse().unwrap();
        assert_eq!(parsed.bucket(), "tubely-videos");
        assert_eq!(parsed.key(), "landscape/abc_-1.mp4");
        assert_eq!(parsed, reference);
    }

    #[test]
    fn test_reference_rejects_wrong_shapes() {
        for raw in [
            "",
            "bucket-only",
            "bucket,key,extra",
            ",key",
            "bucket,",
            ",",
        ] {
            let res = raw.parse::<AssetReference>();
            assert!(
                matches!(res, Err(IngestError::InvalidInput(_))),
                "expected '{}' to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_object_ref_to_reference() {
        let object = StorageObjectRef {
            bucket: "media".to_string(),
            region: "us-east-1".to_string(),
            key: "portrait/k.mp4".to_string(),
        };
        assert_eq!(object.reference().unwrap().to_string(), "media,portrait/k.mp4");
    }

    #[test]
    fn test_aspect_label_serialization() {
        assert_eq!(AspectLabel::Landscape.to_string(), "landscape");
        assert_eq!(
            serde_json::to_string(&AspectLabel::Portrait).unwrap(),
            "\"portrait\""
        );
    }
}

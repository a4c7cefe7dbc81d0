use crate::error::IngestError;
use crate::models::{AssetReference, NewVideo, Video};
use crate::services::storage::StorageService;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::time::Duration;
use uuid::Uuid;

/// Persistence boundary for video records.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, IngestError>;
    async fn create_video(&self, user_id: Uuid, video: NewVideo) -> Result<Video, IngestError>;
    /// Replaces the stored record with the same id; fails if there is none.
    async fn update_video(&self, video: Video) -> Result<Video, IngestError>;
}

#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: DashMap<Uuid, Video>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, IngestError> {
        Ok(self.videos.get(&id).map(|v| v.clone()))
    }

    async fn create_video(&self, user_id: Uuid, video: NewVideo) -> Result<Video, IngestError> {
        let now = Utc::now();
        let record = Video {
            id: Uuid::new_v4(),
            user_id,
            title: video.title,
            description: video.description,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        };
        self.videos.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_video(&self, mut video: Video) -> Result<Video, IngestError> {
        let mut entry = self
            .videos
            .get_mut(&video.id)
            .ok_or_else(|| IngestError::NotFound(format!("video {}", video.id)))?;
        video.updated_at = Utc::now();
        *entry = video.clone();
        Ok(video)
    }
}

/// Loads a video and checks that `user_id` owns it.
pub async fn find_owned_video(
    repo: &dyn VideoRepository,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<Video, IngestError> {
    let video = repo
        .get_video(video_id)
        .await?
        .ok_or_else(|| IngestError::NotFound(format!("Couldn't find video {}", video_id)))?;
    authorize_owner(&video, user_id)?;
    Ok(video)
}

pub fn authorize_owner(video: &Video, user_id: Uuid) -> Result<(), IngestError> {
    if video.user_id != user_id {
        return Err(IngestError::Unauthorized(
            "Not authorized to modify this video".to_string(),
        ));
    }
    Ok(())
}

/// Replaces the stored `<bucket>,<key>` reference with a presigned URL.
pub async fn sign_video(
    storage: &dyn StorageService,
    mut video: Video,
    ttl: Duration,
) -> Result<Video, IngestError> {
    let Some(stored) = video.video_url.as_deref() else {
        return Ok(video);
    };

    let reference: AssetReference = stored.parse()?;
    let url = storage
        .presign(reference.bucket(), reference.key(), ttl)
        .await?;
    video.video_url = Some(url);
    Ok(video)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NewVideo {
        NewVideo {
            title: title.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();

        let created = repo.create_video(owner, draft("boots")).await.unwrap();
        assert_eq!(created.user_id, owner);
        assert!(created.video_url.is_none());

        let mut fetched = repo.get_video(created.id).await.unwrap().unwrap();
        fetched.video_url = Some("bucket,landscape/k.mp4".to_string());
        let updated = repo.update_video(fetched).await.unwrap();
        assert!(updated.updated_at >= created.updated_at);

        let stored = repo.get_video(created.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url.as_deref(), Some("bucket,landscape/k.mp4"));
    }

    #[tokio::test]
    async fn test_update_unknown_video() {
        let repo = InMemoryVideoRepository::new();
        let created = repo.create_video(Uuid::new_v4(), draft("x")).await.unwrap();
        let mut ghost = created.clone();
        ghost.id = Uuid::new_v4();

        let res = repo.update_video(ghost).await;
        assert!(matches!(res, Err(IngestError::NotFound(_))));
        assert!(repo.get_video(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_owned_video() {
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        let video = repo.create_video(owner, draft("x")).await.unwrap();

        assert!(find_owned_video(&repo, video.id, owner).await.is_ok());
        assert!(matches!(
            find_owned_video(&repo, video.id, Uuid::new_v4()).await,
            Err(IngestError::Unauthorized(_))
        ));
        assert!(matches!(
            find_owned_video(&repo, Uuid::new_v4(), owner).await,
            Err(IngestError::NotFound(_))
        ));
    }
}

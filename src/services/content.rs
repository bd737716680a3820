//! Content service
//!
//! Every save goes through the slug assigner, so callers never pick slugs.

use crate::db::repositories::ContentRepository;
use crate::models::Content;
use crate::services::slug::{SlugAssigner, SlugError};
use anyhow::Context;
use std::sync::Arc;

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<SlugError> for ContentServiceError {
    fn from(e: SlugError) -> Self {
        match e {
            SlugError::EmptyName => Self::ValidationError(e.to_string()),
            SlugError::InternalError(inner) => Self::InternalError(inner),
        }
    }
}

pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    slugs: SlugAssigner,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self {
            slugs: SlugAssigner::new(repo.clone()),
            repo,
        }
    }

    /// Create content named `name` owned by `user_id`
    pub async fn create(&self, name: &str, user_id: i64) -> Result<Content, ContentServiceError> {
        let name = name.trim();
        let mut content = Content::new(name, user_id);
        content.slug = self.slugs.assign(name, None).await?;

        let created = self
            .repo
            .create(&content)
            .await
            .context("Failed to create content")?;
        tracing::info!("Created content '{}' for user {}", created.slug, user_id);
        Ok(created)
    }

    /// Rename `content`, re-deriving its slug
    pub async fn rename(&self, content: &Content, name: &str) -> Result<Content, ContentServiceError> {
        let name = name.trim();
        let slug = self
            .slugs
            .assign(name, Some(content))
            .await?;

        let updated = Content {
            name: name.to_string(),
            slug,
            ..content.clone()
        };
        let saved = self
            .repo
            .update(&updated)
            .await
            .context("Failed to update content")?;
        tracing::debug!("Saved content {} as '{}'", saved.id, saved.slug);
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        if !self.repo.delete(id).await.context("Failed to delete content")? {
            return Err(ContentServiceError::NotFound(id.to_string()));
        }
        tracing::info!("Deleted content {}", id);
        Ok(())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Content>, ContentServiceError> {
        Ok(self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get content")?)
    }

    pub async fn list(&self) -> Result<Vec<Content>, ContentServiceError> {
        Ok(self.repo.list().await.context("Failed to list contents")?)
    }
}

//! User service
//!
//! Resolves session tokens into users. Account creation and session issuing
//! exist for the host application and for tests; there is no password login.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    pub async fn create(&self, username: &str, email: &str) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .create(&User::new(username, email))
            .await
            .context("Failed to create user")?;
        tracing::info!("Created user '{}' ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.user_repo.get_by_id(id).await.context("Failed to get user")?)
    }

    /// New session for `user_id`, valid for `lifetime`
    pub async fn issue_session(
        &self,
        user_id: i64,
        lifetime: Duration,
    ) -> Result<Session, UserServiceError> {
        if self.get_by_id(user_id).await?.is_none() {
            return Err(UserServiceError::NotFound(user_id));
        }
        let session = Session::issue(user_id, lifetime);
        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }

    /// User owning a live session, `None` for unknown or expired tokens
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        self.get_by_id(session.user_id).await
    }
}

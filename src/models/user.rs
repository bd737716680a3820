//! User model
//!
//! Accounts are created and authenticated by the host application. Views only
//! need to know who is asking and whether they own a piece of content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user, as seen by the views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            username: username.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether this user is the owner recorded on a piece of content
    pub fn owns(&self, owner_id: i64) -> bool {
        self.id == owner_id
    }
}

/// User summary exposed to templates and JSON payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

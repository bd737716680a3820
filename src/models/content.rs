//! Content base entity
//!
//! Every content table shares these columns. The slug is never set by
//! callers: `ContentService` derives it from the name on each save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, owned and slugged piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-safe identifier, unique within its table
    pub slug: String,
    /// Owner
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
}

impl Content {
    /// Unsaved content; `id` and `slug` are filled in on save
    pub fn new(name: impl Into<String>, user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            slug: String::new(),
            user_id,
            created_at: now,
            updated_at: now,
            published_at: now,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    /// Path of the detail page
    pub fn absolute_url(&self) -> String {
        format!("/contents/{}", self.slug)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Submitted fields for creating or renaming content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentForm {
    #[serde(default)]
    pub name: String,
}

//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Login session issued by the host application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// New session with a random token, valid for `lifetime`
    pub fn issue(user_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: crate::util::generate_uuid(),
            user_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

//! Session repository
//!
//! Sessions are issued by the host application's login flow. The views only
//! look tokens up, so the surface here is small.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by token
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool
            .as_sqlite()
            .context("Session repository expected a SQLite pool")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool
            .as_mysql()
            .context("Session repository expected a MySQL pool")
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        let sql = "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&session.id)
                    .bind(session.user_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(self.sqlite()?)
                    .await
                    .context("Failed to create session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&session.id)
                    .bind(session.user_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(self.mysql()?)
                    .await
                    .context("Failed to create session")?;
            }
        }
        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        let sql = "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.sqlite()?)
                    .await
                    .context("Failed to get session")?;
                Ok(row.map(|r| Session {
                    id: r.get("id"),
                    user_id: r.get("user_id"),
                    expires_at: r.get("expires_at"),
                    created_at: r.get("created_at"),
                }))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.mysql()?)
                    .await
                    .context("Failed to get session")?;
                Ok(row.map(|r| Session {
                    id: r.get("id"),
                    user_id: r.get("user_id"),
                    expires_at: r.get("expires_at"),
                    created_at: r.get("created_at"),
                }))
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let sql = "DELETE FROM sessions WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.sqlite()?)
                    .await
                    .context("Failed to delete session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.mysql()?)
                    .await
                    .context("Failed to delete session")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup() -> SqlxSessionRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        sqlx::query("INSERT INTO users (id, username, email) VALUES (1, 'ana', 'ana@example.com')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        SqlxSessionRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let repo = setup().await;
        let session = Session::issue(1, Duration::hours(1));

        repo.create(&session).await.unwrap();
        let found = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, 1);
        assert!(!found.is_expired());

        repo.delete(&session.id).await.unwrap();
        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let repo = setup().await;
        assert!(repo.get_by_id("nope").await.unwrap().is_none());
    }
}

//! User repository
//!
//! Read access to accounts plus `create` for seeding. Password handling
//! belongs to the host application.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;
}

pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool
            .as_sqlite()
            .context("User repository expected a SQLite pool")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool
            .as_mysql()
            .context("User repository expected a MySQL pool")
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let sql = "INSERT INTO users (username, email, created_at) VALUES (?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&user.username)
                .bind(&user.email)
                .bind(user.created_at)
                .execute(self.sqlite()?)
                .await
                .with_context(|| format!("Failed to create user '{}'", user.username))?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&user.username)
                .bind(&user.email)
                .bind(user.created_at)
                .execute(self.mysql()?)
                .await
                .with_context(|| format!("Failed to create user '{}'", user.username))?
                .last_insert_id() as i64,
        };

        Ok(User {
            id,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = "SELECT id, username, email, created_at FROM users WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.sqlite()?)
                    .await
                    .context("Failed to get user")?;
                Ok(row.map(|r| row_to_user_sqlite(&r)))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.mysql()?)
                    .await
                    .context("Failed to get user")?;
                Ok(row.map(|r| row_to_user_mysql(&r)))
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = "SELECT id, username, email, created_at FROM users WHERE username = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(username)
                    .fetch_optional(self.sqlite()?)
                    .await
                    .context("Failed to get user by username")?;
                Ok(row.map(|r| row_to_user_sqlite(&r)))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(username)
                    .fetch_optional(self.mysql()?)
                    .await
                    .context("Failed to get user by username")?;
                Ok(row.map(|r| row_to_user_mysql(&r)))
            }
        }
    }
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = setup().await;
        let created = repo.create(&User::new("ana", "ana@example.com")).await.unwrap();
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "ana");

        let by_name = repo.get_by_username("ana").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let repo = setup().await;
        repo.create(&User::new("ana", "a@example.com")).await.unwrap();
        assert!(repo.create(&User::new("ana", "b@example.com")).await.is_err());
    }
}

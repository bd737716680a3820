//! Content repository
//!
//! One repository instance serves one content table. Every table must carry
//! the base columns (`id, name, slug, user_id, created_at, updated_at,
//! published_at`) with a `UNIQUE` slug.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Content;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COLUMNS: &str = "id, name, slug, user_id, created_at, updated_at, published_at";

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn create(&self, content: &Content) -> Result<Content>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Content>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Content>>;
    async fn list(&self) -> Result<Vec<Content>>;
    async fn update(&self, content: &Content) -> Result<Content>;
    /// Returns false when no row had that id
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxContentRepository {
    pool: DynDatabasePool,
    table: &'static str,
}

impl SqlxContentRepository {
    /// Repository over the `contents` table
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            pool,
            table: "contents",
        }
    }

    /// Repository over another table with the content columns
    pub fn for_table(pool: DynDatabasePool, table: &'static str) -> Result<Self> {
        let valid = !table.is_empty()
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            anyhow::bail!("Invalid content table name: {}", table);
        }
        Ok(Self { pool, table })
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool
            .as_sqlite()
            .context("Content repository expected a SQLite pool")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool
            .as_mysql()
            .context("Content repository expected a MySQL pool")
    }
}

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn create(&self, content: &Content) -> Result<Content> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.sqlite()?, self.table, content).await,
            DatabaseDriver::Mysql => create_mysql(self.mysql()?, self.table, content).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.sqlite()?, self.table, id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.mysql()?, self.table, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.sqlite()?, self.table, slug).await,
            DatabaseDriver::Mysql => get_by_slug_mysql(self.mysql()?, self.table, slug).await,
        }
    }

    async fn list(&self) -> Result<Vec<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.sqlite()?, self.table).await,
            DatabaseDriver::Mysql => list_mysql(self.mysql()?, self.table).await,
        }
    }

    async fn update(&self, content: &Content) -> Result<Content> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.sqlite()?, self.table, content).await,
            DatabaseDriver::Mysql => update_mysql(self.mysql()?, self.table, content).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .execute(self.sqlite()?)
                .await
                .context("Failed to delete content")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .execute(self.mysql()?)
                .await
                .context("Failed to delete content")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, table: &str, content: &Content) -> Result<Content> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO {} (name, slug, user_id, created_at, updated_at, published_at) VALUES (?, ?, ?, ?, ?, ?)",
        table
    );
    let result = sqlx::query(&sql)
        .bind(&content.name)
        .bind(&content.slug)
        .bind(content.user_id)
        .bind(now)
        .bind(now)
        .bind(content.published_at)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create content '{}'", content.slug))?;

    Ok(Content {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..content.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, table: &str, id: i64) -> Result<Option<Content>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", COLUMNS, table);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content")?;
    Ok(row.map(|r| row_to_content_sqlite(&r)))
}

async fn get_by_slug_sqlite(pool: &SqlitePool, table: &str, slug: &str) -> Result<Option<Content>> {
    let sql = format!("SELECT {} FROM {} WHERE slug = ?", COLUMNS, table);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get content by slug")?;
    Ok(row.map(|r| row_to_content_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool, table: &str) -> Result<Vec<Content>> {
    let sql = format!("SELECT {} FROM {} ORDER BY published_at DESC, id DESC", COLUMNS, table);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list contents")?;
    Ok(rows.iter().map(row_to_content_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, table: &str, content: &Content) -> Result<Content> {
    let now = Utc::now();
    let sql = format!("UPDATE {} SET name = ?, slug = ?, updated_at = ? WHERE id = ?", table);
    sqlx::query(&sql)
        .bind(&content.name)
        .bind(&content.slug)
        .bind(now)
        .bind(content.id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update content {}", content.id))?;
    get_by_id_sqlite(pool, table, content.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Content not found after update"))
}

fn row_to_content_sqlite(row: &sqlx::sqlite::SqliteRow) -> Content {
    Content {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        published_at: row.get("published_at"),
    }
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, table: &str, content: &Content) -> Result<Content> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO {} (name, slug, user_id, created_at, updated_at, published_at) VALUES (?, ?, ?, ?, ?, ?)",
        table
    );
    let result = sqlx::query(&sql)
        .bind(&content.name)
        .bind(&content.slug)
        .bind(content.user_id)
        .bind(now)
        .bind(now)
        .bind(content.published_at)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create content '{}'", content.slug))?;

    Ok(Content {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..content.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, table: &str, id: i64) -> Result<Option<Content>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", COLUMNS, table);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content")?;
    Ok(row.map(|r| row_to_content_mysql(&r)))
}

async fn get_by_slug_mysql(pool: &MySqlPool, table: &str, slug: &str) -> Result<Option<Content>> {
    let sql = format!("SELECT {} FROM {} WHERE slug = ?", COLUMNS, table);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get content by slug")?;
    Ok(row.map(|r| row_to_content_mysql(&r)))
}

async fn list_mysql(pool: &MySqlPool, table: &str) -> Result<Vec<Content>> {
    let sql = format!("SELECT {} FROM {} ORDER BY published_at DESC, id DESC", COLUMNS, table);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list contents")?;
    Ok(rows.iter().map(row_to_content_mysql).collect())
}

async fn update_mysql(pool: &MySqlPool, table: &str, content: &Content) -> Result<Content> {
    let now = Utc::now();
    let sql = format!("UPDATE {} SET name = ?, slug = ?, updated_at = ? WHERE id = ?", table);
    sqlx::query(&sql)
        .bind(&content.name)
        .bind(&content.slug)
        .bind(now)
        .bind(content.id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update content {}", content.id))?;
    get_by_id_mysql(pool, table, content.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Content not found after update"))
}

fn row_to_content_mysql(row: &sqlx::mysql::MySqlRow) -> Content {
    Content {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        published_at: row.get("published_at"),
    }
}

//! Item store contract and Postgres implementation

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::item::Item,
};

/// Durable keyed storage for catalog items.
///
/// `save` is the system's compare-and-swap primitive: it writes the item only
/// if the stored version still equals `expected_version`, incrementing the
/// version by one on success and failing with `AppError::VersionConflict`
/// otherwise. Existing rows have no other write path; `insert` only creates
/// new ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Look up an item by id
    async fn find(&self, id: Uuid) -> AppResult<Option<Item>>;

    /// Conditionally write an item, guarded by its version stamp
    async fn save(&self, item: &Item, expected_version: i64) -> AppResult<Item>;

    /// Create a new catalog item
    async fn insert(&self, item: &Item) -> AppResult<Item>;

    /// List items with offset pagination, returning the page and total count
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Item>, i64)>;
}

#[derive(Clone)]
pub struct PgItemStore {
    pool: Pool<Postgres>,
}

impl PgItemStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, title, author, available, version FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn save(&self, item: &Item, expected_version: i64) -> AppResult<Item> {
        // The WHERE clause on version is the whole concurrency story: a stale
        // expected_version matches zero rows and the write is rejected.
        sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET title = $2, author = $3, available = $4, version = version + 1
            WHERE id = $1 AND version = $5
            RETURNING id, title, author, available, version
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.author)
        .bind(item.available)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::VersionConflict {
            expected: expected_version,
        })
    }

    async fn insert(&self, item: &Item) -> AppResult<Item> {
        let created = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (id, title, author, available, version)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author, available, version
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.author)
        .bind(item.available)
        .bind(item.version)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Item>, i64)> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, title, author, available, version
            FROM items
            ORDER BY title, id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }
}

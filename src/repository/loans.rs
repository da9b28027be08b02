//! Loan store contract and Postgres implementation

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::loan::Loan};

/// Durable storage for active loan records.
///
/// The contract does not enforce uniqueness of (user_id, item_id); under the
/// availability invariant the lending service never creates more than one
/// loan per item, so lookups have expected cardinality 0 or 1.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Record a new active loan
    async fn create(&self, loan: &Loan) -> AppResult<()>;

    /// Remove a loan record
    async fn delete(&self, loan: &Loan) -> AppResult<()>;

    /// Find loans held by a user on a specific item
    async fn find_by_user_and_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<Vec<Loan>>;

    /// Find all loans held by a user
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Loan>>;
}

#[derive(Clone)]
pub struct PgLoanStore {
    pool: Pool<Postgres>,
}

impl PgLoanStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn create(&self, loan: &Loan) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO loans (id, user_id, item_id, borrowed_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(loan.id)
        .bind(loan.user_id)
        .bind(loan.item_id)
        .bind(loan.borrowed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, loan: &Loan) -> AppResult<()> {
        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(loan.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_by_user_and_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, user_id, item_id, borrowed_at
            FROM loans
            WHERE user_id = $1 AND item_id = $2
            ORDER BY borrowed_at
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, user_id, item_id, borrowed_at
            FROM loans
            WHERE user_id = $1
            ORDER BY borrowed_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }
}

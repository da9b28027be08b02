//! Store contracts and their Postgres implementations

pub mod items;
pub mod loans;

pub use items::{ItemStore, PgItemStore};
pub use loans::{LoanStore, PgLoanStore};

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub items: PgItemStore,
    pub loans: PgLoanStore,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            items: PgItemStore::new(pool.clone()),
            loans: PgLoanStore::new(pool.clone()),
            pool,
        }
    }
}

//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::item::Item;

/// An active borrowing relationship between a user and an item.
///
/// Created when a borrow succeeds, deleted when the return succeeds, and
/// never updated in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
}

impl Loan {
    pub fn new(user_id: Uuid, item_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            item_id,
            borrowed_at: Utc::now(),
        }
    }
}

/// A loan joined with its catalog item, for per-user listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowedItemView {
    pub item_id: Uuid,
    pub title: String,
    pub author: String,
    pub borrowed_at: DateTime<Utc>,
}

impl BorrowedItemView {
    pub fn from_parts(loan: &Loan, item: &Item) -> Self {
        Self {
            item_id: item.id,
            title: item.title.clone(),
            author: item.author.clone(),
            borrowed_at: loan.borrowed_at,
        }
    }
}

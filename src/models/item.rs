//! Catalog item model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A lendable catalog item.
///
/// `available` is owned by the lending service: it is true iff no active
/// loan references the item. `version` is the optimistic concurrency token,
/// incremented by the store on every successful write; callers treat it as
/// opaque and never set it themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub available: bool,
    #[serde(skip_serializing, default)]
    pub version: i64,
}

impl Item {
    /// Create a new available item at the initial version
    pub fn new(title: String, author: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            author,
            available: true,
            version: 0,
        }
    }
}

/// Create item request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    /// Item title
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    /// Item author
    #[validate(length(min = 1, message = "author must not be empty"))]
    pub author: String,
}

/// Pagination query for catalog listing
#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

//! Lending endpoints: borrow, return, and per-user loan listing

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{item::Item, loan::BorrowedItemView},
};

/// Borrower identification, passed as a query parameter
#[derive(Deserialize)]
pub struct UserQuery {
    /// User ID
    pub user_id: Uuid,
}

/// Borrow an item for a user
#[utoipa::path(
    post,
    path = "/items/{id}/borrow",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Item ID"),
        ("user_id" = Uuid, Query, description = "Borrowing user ID")
    ),
    responses(
        (status = 200, description = "Item borrowed", body = Item),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item already on loan, or lost a concurrent borrow race")
    )
)]
pub async fn borrow_item(
    State(state): State<crate::AppState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Item>> {
    let item = state
        .services
        .lending
        .borrow(item_id, query.user_id)
        .await?;
    Ok(Json(item))
}

/// Return a borrowed item
#[utoipa::path(
    post,
    path = "/items/{id}/return",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Item ID"),
        ("user_id" = Uuid, Query, description = "Returning user ID")
    ),
    responses(
        (status = 200, description = "Item returned", body = Item),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item already available, or no loan for this user")
    )
)]
pub async fn return_item(
    State(state): State<crate::AppState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Item>> {
    let item = state
        .services
        .lending
        .return_item(item_id, query.user_id)
        .await?;
    Ok(Json(item))
}

/// List the items a user currently has on loan
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(
        ("user_id" = Uuid, Query, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's active loans", body = Vec<BorrowedItemView>)
    )
)]
pub async fn list_user_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<BorrowedItemView>>> {
    let loans = state
        .services
        .lending
        .list_loans_by_user(query.user_id)
        .await?;
    Ok(Json(loans))
}

//! Lending service: borrow/return state transitions over the two stores.
//!
//! All cross-request safety rests on the item store's version stamp. The
//! service holds no lock across store calls; a borrow that reads stale state
//! simply loses the conditional write and surfaces `ConcurrencyConflict`.
//! Retrying is the caller's decision.
//!
//! Each operation performs two independent writes (item save + loan create,
//! or loan delete + item save) with no transaction spanning them. A crash in
//! the window leaves the item unavailable with no matching loan. That side of
//! the inconsistency is deliberate: it needs manual cleanup but can never
//! hand the same item to two borrowers.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        item::Item,
        loan::{BorrowedItemView, Loan},
    },
    repository::{ItemStore, LoanStore},
};

#[derive(Clone)]
pub struct LendingService {
    items: Arc<dyn ItemStore>,
    loans: Arc<dyn LoanStore>,
}

impl LendingService {
    pub fn new(items: Arc<dyn ItemStore>, loans: Arc<dyn LoanStore>) -> Self {
        Self { items, loans }
    }

    /// Add a new item to the catalog
    pub async fn add_item(&self, title: String, author: String) -> AppResult<Item> {
        tracing::info!("Adding new item: {} by {}", title, author);
        self.items.insert(&Item::new(title, author)).await
    }

    /// List catalog items with offset pagination
    pub async fn list_items(&self, offset: i64, limit: i64) -> AppResult<(Vec<Item>, i64)> {
        self.items.list(offset, limit).await
    }

    /// Borrow an item for a user.
    ///
    /// Of N callers racing on the same item, at most one succeeds; the rest
    /// see `ItemUnavailable` (read after the winner's write) or
    /// `ConcurrencyConflict` (read stale state, lost the conditional write).
    pub async fn borrow(&self, item_id: Uuid, user_id: Uuid) -> AppResult<Item> {
        tracing::info!("User {} requested to borrow item {}", user_id, item_id);

        let mut item = self.items.find(item_id).await?.ok_or_else(|| {
            tracing::warn!("Item not found: {}", item_id);
            AppError::ItemNotFound(item_id)
        })?;

        if !item.available {
            tracing::warn!("Item {} is already on loan", item_id);
            return Err(AppError::ItemUnavailable(
                "Item is already on loan".to_string(),
            ));
        }

        item.available = false;
        let expected = item.version;
        let saved = self
            .items
            .save(&item, expected)
            .await
            .map_err(|e| Self::map_lost_race(e, item_id))?;

        // Not atomic with the save above; see the module docs for why the
        // window is biased toward "unavailable with no loan".
        self.loans.create(&Loan::new(user_id, item_id)).await?;

        Ok(saved)
    }

    /// Return a borrowed item.
    ///
    /// The loan record is deleted before the item is marked available again,
    /// so an interrupted return can leave the item falsely unavailable but
    /// never available with a dangling loan.
    pub async fn return_item(&self, item_id: Uuid, user_id: Uuid) -> AppResult<Item> {
        tracing::info!("User {} is returning item {}", user_id, item_id);

        let mut item = self
            .items
            .find(item_id)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))?;

        if item.available {
            tracing::warn!(
                "User {} cannot return item {}: it is already available",
                user_id,
                item_id
            );
            return Err(AppError::ItemUnavailable(
                "Item is already marked as available".to_string(),
            ));
        }

        let loan = self
            .loans
            .find_by_user_and_item(user_id, item_id)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::LoanNotFound { user_id, item_id })?;

        self.loans.delete(&loan).await?;

        item.available = true;
        let expected = item.version;
        self.items
            .save(&item, expected)
            .await
            .map_err(|e| Self::map_lost_race(e, item_id))
    }

    /// List the items a user currently has on loan.
    ///
    /// Loans whose catalog entry has disappeared are logged and skipped;
    /// catalog deletion is outside this service's write path but has to be
    /// tolerated.
    pub async fn list_loans_by_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowedItemView>> {
        let loans = self.loans.find_by_user(user_id).await?;

        let mut views = Vec::with_capacity(loans.len());
        for loan in loans {
            match self.items.find(loan.item_id).await? {
                Some(item) => views.push(BorrowedItemView::from_parts(&loan, &item)),
                None => {
                    tracing::warn!("Item {} not found for loan {}, skipping", loan.item_id, loan.id)
                }
            }
        }

        Ok(views)
    }

    /// Translate a store-level version conflict into the domain outcome of a
    /// lost optimistic race. Everything else propagates unmodified.
    fn map_lost_race(err: AppError, item_id: Uuid) -> AppError {
        match err {
            AppError::VersionConflict { .. } => {
                tracing::warn!("Lost optimistic race on item {}", item_id);
                AppError::ConcurrencyConflict(
                    "Item was just updated by another request".to_string(),
                )
            }
            other => other,
        }
    }
}

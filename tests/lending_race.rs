//! Lending concurrency and invariant tests against in-memory stores.
//!
//! The in-memory stores implement the same conditional-write contract as the
//! Postgres ones, so the service's optimistic concurrency behavior can be
//! exercised without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use alcove_server::{
    error::{AppError, AppResult},
    models::{item::Item, loan::Loan},
    repository::{ItemStore, LoanStore},
    services::lending::LendingService,
};

#[derive(Default)]
struct MemItemStore {
    items: RwLock<HashMap<Uuid, Item>>,
}

#[async_trait]
impl ItemStore for MemItemStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn save(&self, item: &Item, expected_version: i64) -> AppResult<Item> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(&item.id)
            .ok_or(AppError::ItemNotFound(item.id))?;

        if stored.version != expected_version {
            return Err(AppError::VersionConflict {
                expected: expected_version,
            });
        }

        let mut updated = item.clone();
        updated.version = expected_version + 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn insert(&self, item: &Item) -> AppResult<Item> {
        let mut items = self.items.write().await;
        items.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Item>, i64)> {
        let items = self.items.read().await;
        let total = items.len() as i64;
        let mut all: Vec<Item> = items.values().cloned().collect();
        all.sort_by(|a, b| (&a.title, a.id).cmp(&(&b.title, b.id)));
        let page = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[derive(Default)]
struct MemLoanStore {
    loans: RwLock<HashMap<Uuid, Loan>>,
}

#[async_trait]
impl LoanStore for MemLoanStore {
    async fn create(&self, loan: &Loan) -> AppResult<()> {
        self.loans.write().await.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn delete(&self, loan: &Loan) -> AppResult<()> {
        self.loans.write().await.remove(&loan.id);
        Ok(())
    }

    async fn find_by_user_and_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<Vec<Loan>> {
        let mut found: Vec<Loan> = self
            .loans
            .read()
            .await
            .values()
            .filter(|l| l.user_id == user_id && l.item_id == item_id)
            .cloned()
            .collect();
        found.sort_by_key(|l| l.borrowed_at);
        Ok(found)
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Loan>> {
        let mut found: Vec<Loan> = self
            .loans
            .read()
            .await
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|l| l.borrowed_at);
        Ok(found)
    }
}

struct Harness {
    items: Arc<MemItemStore>,
    loans: Arc<MemLoanStore>,
    service: LendingService,
}

fn harness() -> Harness {
    let items = Arc::new(MemItemStore::default());
    let loans = Arc::new(MemLoanStore::default());
    let service = LendingService::new(items.clone(), loans.clone());
    Harness {
        items,
        loans,
        service,
    }
}

async fn loans_for_item(loans: &MemLoanStore, item_id: Uuid) -> usize {
    loans
        .loans
        .read()
        .await
        .values()
        .filter(|l| l.item_id == item_id)
        .count()
}

/// Availability invariant at rest: available iff no loan references the item,
/// and never more than one loan per item.
async fn assert_invariant(h: &Harness) {
    let items = h.items.items.read().await;
    for item in items.values() {
        let count = loans_for_item(&h.loans, item.id).await;
        assert!(count <= 1, "item {} has {} loans", item.id, count);
        assert_eq!(
            item.available,
            count == 0,
            "item {} availability disagrees with its loan count",
            item.id
        );
    }
}

#[tokio::test]
async fn two_concurrent_borrows_produce_exactly_one_winner() {
    let h = harness();
    let item = h
        .service
        .add_item("Dune".to_string(), "Frank Herbert".to_string())
        .await
        .unwrap();

    let u1 = Uuid::new_v4();
    let u2 = Uuid::new_v4();

    let (r1, r2) = tokio::join!(h.service.borrow(item.id, u1), h.service.borrow(item.id, u2));

    let results = [r1, r2];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one borrower may win");

    for r in &results {
        if let Err(e) = r {
            assert!(
                matches!(
                    e,
                    AppError::ItemUnavailable(_) | AppError::ConcurrencyConflict(_)
                ),
                "loser saw unexpected error: {e}"
            );
        }
    }

    assert_eq!(loans_for_item(&h.loans, item.id).await, 1);
    assert_invariant(&h).await;
}

#[tokio::test]
async fn many_concurrent_borrows_still_single_winner() {
    let h = harness();
    let item = h
        .service
        .add_item("Solaris".to_string(), "Stanislaw Lem".to_string())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let svc = h.service.clone();
        let item_id = item.id;
        handles.push(tokio::spawn(
            async move { svc.borrow(item_id, Uuid::new_v4()).await },
        ));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::ItemUnavailable(_)) | Err(AppError::ConcurrencyConflict(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(loans_for_item(&h.loans, item.id).await, 1);
    assert_invariant(&h).await;
}

#[tokio::test]
async fn borrow_return_round_trip_restores_availability() {
    let h = harness();
    let user = Uuid::new_v4();
    let item = h
        .service
        .add_item("Emma".to_string(), "Jane Austen".to_string())
        .await
        .unwrap();

    let borrowed = h.service.borrow(item.id, user).await.unwrap();
    assert!(!borrowed.available);
    assert_eq!(borrowed.version, 1);
    assert_eq!(loans_for_item(&h.loans, item.id).await, 1);

    let returned = h.service.return_item(item.id, user).await.unwrap();
    assert!(returned.available);
    assert_eq!(returned.version, 2);
    assert_eq!(loans_for_item(&h.loans, item.id).await, 0);
    assert_invariant(&h).await;
}

#[tokio::test]
async fn double_return_fails_once_item_is_available() {
    let h = harness();
    let user = Uuid::new_v4();
    let item = h
        .service
        .add_item("Ficciones".to_string(), "Jorge Luis Borges".to_string())
        .await
        .unwrap();

    h.service.borrow(item.id, user).await.unwrap();
    h.service.return_item(item.id, user).await.unwrap();

    let err = h.service.return_item(item.id, user).await.unwrap_err();
    assert!(matches!(err, AppError::ItemUnavailable(_)));
}

#[tokio::test]
async fn return_by_wrong_user_reports_loan_not_found() {
    let h = harness();
    let holder = Uuid::new_v4();
    let other = Uuid::new_v4();
    let item = h
        .service
        .add_item("Blindness".to_string(), "Jose Saramago".to_string())
        .await
        .unwrap();

    h.service.borrow(item.id, holder).await.unwrap();

    // The item is genuinely on loan, just not to this user.
    let err = h.service.return_item(item.id, other).await.unwrap_err();
    assert!(matches!(err, AppError::LoanNotFound { .. }));

    // The holder's loan is untouched.
    assert_eq!(loans_for_item(&h.loans, item.id).await, 1);
    assert_invariant(&h).await;
}

#[tokio::test]
async fn borrow_of_unknown_item_reports_not_found() {
    let h = harness();
    let err = h
        .service
        .borrow(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ItemNotFound(_)));
}

#[tokio::test]
async fn save_increments_version_by_one_and_rejects_stale_writes() {
    let h = harness();
    let item = h
        .service
        .add_item("Kindred".to_string(), "Octavia Butler".to_string())
        .await
        .unwrap();
    assert_eq!(item.version, 0);

    let v1 = h.items.save(&item, 0).await.unwrap();
    assert_eq!(v1.version, 1);

    let v2 = h.items.save(&v1, 1).await.unwrap();
    assert_eq!(v2.version, 2);

    // A writer holding the original snapshot always loses.
    let err = h.items.save(&item, 0).await.unwrap_err();
    assert!(matches!(err, AppError::VersionConflict { expected: 0 }));
}

#[tokio::test]
async fn interleaved_borrow_return_churn_preserves_invariant() {
    let h = harness();
    let mut item_ids = Vec::new();
    for i in 0..4 {
        let item = h
            .service
            .add_item(format!("Volume {i}"), "Anonymous".to_string())
            .await
            .unwrap();
        item_ids.push(item.id);
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = h.service.clone();
        let ids = item_ids.clone();
        let user = Uuid::new_v4();
        handles.push(tokio::spawn(async move {
            for round in 0..20 {
                let item_id = ids[round % ids.len()];
                if svc.borrow(item_id, user).await.is_ok() {
                    // Yield so other borrowers observe the held state.
                    tokio::task::yield_now().await;
                    svc.return_item(item_id, user)
                        .await
                        .expect("holder must be able to return");
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_invariant(&h).await;
}

#[tokio::test]
async fn listing_tolerates_items_removed_from_catalog() {
    let h = harness();
    let user = Uuid::new_v4();
    let kept = h
        .service
        .add_item("Persuasion".to_string(), "Jane Austen".to_string())
        .await
        .unwrap();
    let doomed = h
        .service
        .add_item("Lost Volume".to_string(), "Unknown".to_string())
        .await
        .unwrap();

    h.service.borrow(kept.id, user).await.unwrap();
    h.service.borrow(doomed.id, user).await.unwrap();

    // Simulate out-of-band catalog deletion.
    h.items.items.write().await.remove(&doomed.id);

    let views = h.service.list_loans_by_user(user).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].item_id, kept.id);
}

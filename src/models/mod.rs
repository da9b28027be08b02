//! Data models for catalog items and loans

pub mod item;
pub mod loan;

pub use item::{CreateItemRequest, Item};
pub use loan::{BorrowedItemView, Loan};

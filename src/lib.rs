//! Alcove Book Lending Service
//!
//! A REST JSON API for lending catalog items to users. An item is held by at
//! most one borrower at a time; concurrent borrow attempts are arbitrated by
//! optimistic concurrency control on the item's version stamp.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

//! Business logic services

pub mod lending;

use std::sync::Arc;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub lending: lending::LendingService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            lending: lending::LendingService::new(
                Arc::new(repository.items),
                Arc::new(repository.loans),
            ),
        }
    }
}

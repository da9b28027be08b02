//! API handlers for Alcove REST endpoints

pub mod health;
pub mod items;
pub mod loans;
pub mod openapi;

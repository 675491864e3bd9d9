//! Data layer module
//!
//! Handles all persistence:
//! - SQLite database operations
//! - Entity models and identifier parsing

mod database;
mod models;

pub use database::{Database, OwnerProfile};
pub use models::*;

#[cfg(test)]
mod database_test;

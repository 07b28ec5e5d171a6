//! # Kitchen Common Library
//!
//! Shared code for the kitchen inventory service:
//! - Database initialization and versioned migrations
//! - Domain models (catalog, inventory, locations, recipes, photos)
//! - The [`Store`] handle with one module per aggregate
//! - Recipe ingredient block parsing
//! - Catalog CSV import/export
//! - Configuration loading

pub mod catalog_csv;
pub mod config;
pub mod db;
pub mod error;
pub mod parser;
pub mod store;

pub use db::models::Classification;
pub use error::{Error, Result};
pub use store::Store;

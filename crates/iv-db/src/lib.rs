//! iv-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, the image model, and its query module.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

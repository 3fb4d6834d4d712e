//! gallery-db: database access and persistence layer.
//!
//! SQLite-backed storage for image records with connection pooling,
//! embedded migrations, a typed model, and the image query module.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

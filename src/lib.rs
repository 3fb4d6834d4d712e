//! Gallery - image gallery backend
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod images;
pub mod media_store;
pub mod server;

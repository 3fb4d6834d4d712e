//! gallery-common: shared types, IDs and errors.
//!
//! This crate is the foundational dependency for the other gallery crates,
//! providing the typed image identifier, the unified error type, and the set
//! of image formats the upload path accepts.

pub mod error;
pub mod format;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use format::ImageFormat;
pub use ids::ImageId;

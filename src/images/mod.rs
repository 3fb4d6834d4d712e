//! Image upload validation and the gallery service.
//!
//! Uploaded bytes go to the configured media store; the database only keeps
//! the resulting URL, the store's reference and the upload time.

mod service;
mod upload;

pub use service::GalleryService;
pub use upload::{ImageUpload, MAX_FILES_PER_UPLOAD};

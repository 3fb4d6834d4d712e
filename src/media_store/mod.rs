//! Remote media storage.
//!
//! The gallery never keeps image bytes itself. Uploads are handed to a
//! [`MediaStore`], which returns a public URL and its own reference for the
//! asset; deletes are issued against that reference.

mod cloudinary;
mod memory;

pub use cloudinary::{sign_params, CloudinaryStore};
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use gallery_common::Result;

use crate::config::{MediaStoreConfig, StoreBackend};
use crate::images::ImageUpload;

/// An asset accepted by the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Publicly retrievable URL.
    pub url: String,
    /// The store's native reference, used for deletion.
    pub public_id: String,
}

/// A remote object store for image assets.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `file` under `folder` and return where it landed.
    async fn upload(&self, file: &ImageUpload, folder: &str) -> Result<StoredAsset>;

    /// Remove the asset identified by `public_id`.
    async fn delete(&self, public_id: &str) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Build the media store selected in `config`.
pub fn build_media_store(config: &MediaStoreConfig) -> Result<Arc<dyn MediaStore>> {
    match config.backend {
        StoreBackend::Cloudinary => Ok(Arc::new(CloudinaryStore::new(config)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Recover a media store reference from an asset URL.
///
/// Takes the last path segment, drops everything from its first `.`, and
/// prefixes `folder`. Only valid when the store names assets after their
/// reference, which both stores here do.
pub fn derive_public_id(url: &str, folder: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next()?;
    let stem = segment.split('.').next()?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{folder}/{stem}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_from_cloudinary_url() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1712345678/gallery/kq3v9zrn1x.png";
        assert_eq!(
            derive_public_id(url, "gallery").as_deref(),
            Some("gallery/kq3v9zrn1x")
        );
    }

    #[test]
    fn derive_strips_from_first_dot() {
        assert_eq!(
            derive_public_id("https://cdn/x/photo.final.jpeg", "gallery").as_deref(),
            Some("gallery/photo")
        );
    }

    #[test]
    fn derive_ignores_query_string() {
        assert_eq!(
            derive_public_id("https://cdn/x/abc.jpg?width=300", "pics").as_deref(),
            Some("pics/abc")
        );
    }

    #[test]
    fn derive_without_extension() {
        assert_eq!(
            derive_public_id("memory://gallery/abc", "gallery").as_deref(),
            Some("gallery/abc")
        );
    }

    #[test]
    fn derive_rejects_empty_segment() {
        assert_eq!(derive_public_id("https://cdn/x/", "gallery"), None);
        assert_eq!(derive_public_id("https://cdn/x/.png", "gallery"), None);
    }

    #[test]
    fn build_memory_store() {
        let config = MediaStoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        };
        let store = build_media_store(&config).unwrap();
        assert_eq!(store.name(), "memory");
    }
}

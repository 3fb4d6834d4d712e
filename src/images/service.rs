//! Gallery service coordinating the media store and the image records.
//!
//! Provides the three gallery operations (batch upload, list, delete).
//! Database work runs on the blocking pool; media store calls are plain
//! async HTTP. Nothing here is transactional across the two systems.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use gallery_common::{Error, ImageId, Result};
use gallery_db::models::ImageRecord;
use gallery_db::pool::{get_conn, DbPool};
use gallery_db::queries::images;
use rusqlite::Connection;

use super::upload::ImageUpload;
use crate::media_store::{derive_public_id, MediaStore};

/// High-level gallery service shared by all request handlers.
pub struct GalleryService {
    store: Arc<dyn MediaStore>,
    pool: DbPool,
    folder: String,
}

impl GalleryService {
    /// Create a new `GalleryService`.
    ///
    /// # Arguments
    ///
    /// * `store` - The media store holding image bytes
    /// * `pool` - Database connection pool for image records
    /// * `folder` - Folder every upload is grouped under
    pub fn new(store: Arc<dyn MediaStore>, pool: DbPool, folder: impl Into<String>) -> Self {
        Self {
            store,
            pool,
            folder: folder.into(),
        }
    }

    /// Upload every file and record each one.
    ///
    /// Files are processed concurrently and all of them are driven to
    /// completion before returning. Records come back in completion order.
    /// If any file fails, the first failure is returned and the records
    /// already written for the other files stay in place.
    pub async fn upload_batch(&self, files: Vec<ImageUpload>) -> Result<Vec<ImageRecord>> {
        let mut pending: FuturesUnordered<_> = files
            .into_iter()
            .map(|file| self.store_and_record(file))
            .collect();

        let mut records = Vec::with_capacity(pending.len());
        let mut first_error = None;

        while let Some(result) = pending.next().await {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(error = %e, "image upload failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                if !records.is_empty() {
                    tracing::warn!(
                        kept = records.len(),
                        "upload batch failed after recording some images"
                    );
                }
                Err(e)
            }
            None => Ok(records),
        }
    }

    /// All image records, most recent first.
    pub async fn list(&self) -> Result<Vec<ImageRecord>> {
        self.with_conn(|conn| images::list_images(conn)).await
    }

    /// Delete the asset from the media store, then its record.
    ///
    /// The record is only removed once the store has accepted the delete.
    pub async fn delete(&self, id: ImageId) -> Result<()> {
        let record = self
            .with_conn(move |conn| images::get_image(conn, id))
            .await?
            .ok_or_else(|| Error::not_found("image", id))?;

        let public_id = match record.public_id {
            Some(public_id) => public_id,
            None => derive_public_id(&record.url, &self.folder).ok_or_else(|| {
                Error::Internal(format!(
                    "Cannot derive media reference from URL {}",
                    record.url
                ))
            })?,
        };

        self.store.delete(&public_id).await?;

        let removed = self
            .with_conn(move |conn| images::delete_image(conn, id))
            .await?;
        if !removed {
            tracing::debug!(%id, "image record vanished before delete");
        }

        tracing::info!(%id, %public_id, store = self.store.name(), "image deleted");
        Ok(())
    }

    async fn store_and_record(&self, file: ImageUpload) -> Result<ImageRecord> {
        let asset = self.store.upload(&file, &self.folder).await?;
        tracing::debug!(file = %file.file_name, url = %asset.url, "stored image");

        let record = self
            .with_conn(move |conn| {
                images::create_image(conn, &asset.url, Some(asset.public_id.as_str()))
            })
            .await?;

        tracing::info!(id = %record.id, url = %record.url, "image recorded");
        Ok(record)
    }

    /// Run a database closure on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_store::MemoryStore;
    use bytes::Bytes;
    use gallery_common::ImageFormat;
    use gallery_db::pool::init_memory_pool;

    fn service() -> (GalleryService, Arc<MemoryStore>, DbPool) {
        let store = Arc::new(MemoryStore::new());
        let pool = init_memory_pool().unwrap();
        let svc = GalleryService::new(store.clone(), pool.clone(), "gallery");
        (svc, store, pool)
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            format: ImageFormat::Png,
            data: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
        }
    }

    #[tokio::test]
    async fn upload_batch_records_every_file() {
        let (svc, store, _) = service();
        let records = svc.upload_batch(vec![png("a.png"), png("b.png")]).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
        assert_ne!(records[0].url, records[1].url);
        assert_eq!(store.len(), 2);
        assert_eq!(svc.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_ok() {
        let (svc, store, _) = service();
        assert!(svc.upload_batch(Vec::new()).await.unwrap().is_empty());
        assert_eq!(store.upload_calls(), 0);
    }

    #[tokio::test]
    async fn partial_failure_keeps_siblings() {
        let (svc, store, _) = service();
        store.reject_file("bad.png");

        let err = svc
            .upload_batch(vec![png("good.png"), png("bad.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MediaStore(_)));

        let remaining = svc.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(store.upload_calls(), 2);
    }

    #[tokio::test]
    async fn delete_removes_asset_and_record() {
        let (svc, store, _) = service();
        let records = svc.upload_batch(vec![png("a.png")]).await.unwrap();
        let public_id = records[0].public_id.clone().unwrap();

        svc.delete(records[0].id).await.unwrap();
        assert!(!store.contains(&public_id));
        assert!(svc.list().await.unwrap().is_empty());

        let err = svc.delete(records[0].id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_missing_makes_no_remote_call() {
        let (svc, store, _) = service();
        let err = svc.delete(ImageId::new()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(store.delete_calls(), 0);
    }

    #[tokio::test]
    async fn failed_remote_delete_keeps_record() {
        let (svc, store, _) = service();
        let records = svc.upload_batch(vec![png("a.png")]).await.unwrap();

        store.set_fail_deletes(true);
        let err = svc.delete(records[0].id).await.unwrap_err();
        assert!(matches!(err, Error::MediaStore(_)));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_falls_back_to_url_derivation() {
        let (svc, store, pool) = service();
        let records = svc.upload_batch(vec![png("a.png")]).await.unwrap();
        let public_id = records[0].public_id.clone().unwrap();

        // A record written without its reference, pointing at the same asset.
        let conn = get_conn(&pool).unwrap();
        let legacy = images::create_image(&conn, &records[0].url, None).unwrap();
        drop(conn);

        svc.delete(legacy.id).await.unwrap();
        assert!(!store.contains(&public_id));
    }
}

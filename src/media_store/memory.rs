//! Process-local media store.
//!
//! Keeps uploaded bytes in a map keyed by reference. Used by the test
//! harness and by `gallery start --memory-store` for local runs without
//! cloud credentials.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use gallery_common::{Error, Result};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{MediaStore, StoredAsset};
use crate::images::ImageUpload;

/// In-memory [`MediaStore`] with call accounting and failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    assets: Mutex<HashMap<String, Bytes>>,
    rejected_files: Mutex<HashSet<String>>,
    fail_deletes: AtomicBool,
    upload_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads of files named `file_name` fail. Test hook; nothing in
    /// the server calls it.
    pub fn reject_file(&self, file_name: &str) {
        self.rejected_files.lock().insert(file_name.to_string());
    }

    /// Make every delete fail until switched back. Test hook.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether an asset with this reference is held.
    pub fn contains(&self, public_id: &str) -> bool {
        self.assets.lock().contains_key(public_id)
    }

    /// Number of assets currently held.
    pub fn len(&self) -> usize {
        self.assets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upload attempts seen, including failed ones.
    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Delete attempts seen, including failed ones.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn upload(&self, file: &ImageUpload, folder: &str) -> Result<StoredAsset> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if self.rejected_files.lock().contains(&file.file_name) {
            return Err(Error::media_store(format!(
                "upload of {} rejected",
                file.file_name
            )));
        }

        let name = Uuid::new_v4().simple().to_string();
        let public_id = format!("{folder}/{name}");
        let url = format!("memory://{public_id}.{}", file.format.extension());

        self.assets.lock().insert(public_id.clone(), file.data.clone());

        Ok(StoredAsset { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::media_store(format!("delete of {public_id} failed")));
        }

        if self.assets.lock().remove(public_id).is_none() {
            tracing::warn!(public_id, "memory store asset already absent");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

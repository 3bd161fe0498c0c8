//! File-backed byte store
//!
//! One image file per store inside the data directory.
//!
//! ## Responsibilities
//! - Discover existing image files on startup
//! - Serve reads from the in-memory working set
//! - Rewrite the image of a store according to the sync strategy

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{Config, SyncStrategy};
use crate::error::{Result, RmsError};

use super::image::{read_image, write_image};
use super::memory::MemoryByteStore;
use super::{ByteStore, RecordId, StoreHandle, StoreImage, IMAGE_EXTENSION};

/// Directory-backed store: `{data_dir}/{name}.rms`
pub struct FileByteStore {
    /// Directory holding the image files
    data_dir: PathBuf,

    /// When images are rewritten
    sync_strategy: SyncStrategy,

    /// Working set (every store is fully resident)
    inner: MemoryByteStore,
}

impl FileByteStore {
    /// Open or create a file store in `config.data_dir`
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover `*.rms` image files
    /// 3. Load each valid image (corrupt ones are skipped with a warning)
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let inner = MemoryByteStore::from_config(config)?;

        for entry in fs::read_dir(&config.data_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = Self::parse_store_name(&path) else {
                continue;
            };

            match read_image(&path) {
                Ok(image) => {
                    info!(
                        store = %name,
                        records = image.records.len(),
                        bytes = image.used_bytes,
                        "loaded record store"
                    );
                    inner.insert_image(name, image);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable store image");
                }
            }
        }

        Ok(Self {
            data_dir: config.data_dir.clone(),
            sync_strategy: config.sync_strategy,
            inner,
        })
    }

    /// Write the image of one store to disk regardless of sync strategy
    pub fn flush(&self, handle: &StoreHandle) -> Result<()> {
        self.persist(handle.name())
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn persist(&self, name: &str) -> Result<()> {
        let path = self.image_path(name);
        self.inner.with_image(name, |image| write_image(&path, image))?;
        debug!(store = name, path = %path.display(), "wrote store image");
        Ok(())
    }

    /// Apply a record mutation to the image of `handle`
    ///
    /// Under `EveryWrite` the mutated image reaches disk before the working
    /// set sees it, so a failed write leaves both unchanged.
    fn write_through<T>(
        &self,
        handle: &StoreHandle,
        mutate: impl FnOnce(&mut StoreImage) -> Result<T>,
    ) -> Result<T> {
        let name = handle.name();
        match self.sync_strategy {
            SyncStrategy::OnClose => self.inner.with_image_mut(name, mutate),
            SyncStrategy::EveryWrite => {
                let path = self.image_path(name);
                let result = self
                    .inner
                    .with_image_staged(name, mutate, |image| write_image(&path, image))?;
                debug!(store = name, path = %path.display(), "wrote store image");
                Ok(result)
            }
        }
    }

    /// Generate the image path for a store name
    fn image_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", name, IMAGE_EXTENSION))
    }

    /// Parse a store name from an image path
    /// "scores.rms" → Some("scores")
    fn parse_store_name(path: &Path) -> Option<String> {
        if path.extension()? != IMAGE_EXTENSION {
            return None;
        }
        Some(path.file_stem()?.to_string_lossy().into_owned())
    }
}

impl ByteStore for FileByteStore {
    fn open(&self, name: &str, create_if_absent: bool) -> Result<StoreHandle> {
        let existed = self.inner.list()?.iter().any(|n| n == name);
        let handle = self.inner.open(name, create_if_absent)?;
        if !existed {
            if let Err(e) = self.persist(name) {
                // Not on disk, so not created
                self.inner.delete_store(name)?;
                return Err(e);
            }
        }
        Ok(handle)
    }

    fn list(&self) -> Result<Vec<String>> {
        self.inner.list()
    }

    fn delete_store(&self, name: &str) -> Result<()> {
        self.inner.delete_store(name)?;

        let path = self.image_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            // Never persisted (OnClose strategy before first close)
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(RmsError::Io(e)),
        }
        info!(store = name, "deleted record store");
        Ok(())
    }

    fn add(&self, handle: &StoreHandle, data: &[u8]) -> Result<RecordId> {
        let capacity = self.inner.capacity();
        self.write_through(handle, |image| image.insert_record(capacity, data))
    }

    fn get(&self, handle: &StoreHandle, id: RecordId) -> Result<Vec<u8>> {
        self.inner.get(handle, id)
    }

    fn contains(&self, handle: &StoreHandle, id: RecordId) -> Result<bool> {
        self.inner.contains(handle, id)
    }

    fn set(&self, handle: &StoreHandle, id: RecordId, data: &[u8]) -> Result<()> {
        let capacity = self.inner.capacity();
        self.write_through(handle, |image| image.replace_record(capacity, id, data))
    }

    fn delete(&self, handle: &StoreHandle, id: RecordId) -> Result<()> {
        self.write_through(handle, |image| image.remove_record(id))
    }

    fn count(&self, handle: &StoreHandle) -> Result<usize> {
        self.inner.count(handle)
    }

    fn used_bytes(&self, handle: &StoreHandle) -> Result<usize> {
        self.inner.used_bytes(handle)
    }

    fn free_bytes(&self, handle: &StoreHandle) -> Result<usize> {
        self.inner.free_bytes(handle)
    }

    fn ids(&self, handle: &StoreHandle) -> Result<Vec<RecordId>> {
        self.inner.ids(handle)
    }

    fn next_id(&self, handle: &StoreHandle) -> Result<RecordId> {
        self.inner.next_id(handle)
    }

    fn version(&self, handle: &StoreHandle) -> Result<u32> {
        self.inner.version(handle)
    }

    fn last_modified(&self, handle: &StoreHandle) -> Result<u64> {
        self.inner.last_modified(handle)
    }

    fn close(&self, handle: &StoreHandle) -> Result<()> {
        self.persist(handle.name())
    }
}

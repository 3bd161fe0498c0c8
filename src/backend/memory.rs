//! In-memory byte store
//!
//! Volatile backend; also the working set of the file backend.

use parking_lot::Mutex;
use tracing::info;

use crate::config::Config;
use crate::error::{Result, RmsError};
use crate::map::AssociativeMap;

use super::{ByteStore, RecordId, StoreHandle, StoreImage};

/// Stores every image in RAM
///
/// ## Concurrency:
/// - `stores`: one Mutex over the name table (short critical sections)
pub struct MemoryByteStore {
    /// Per-store byte budget
    capacity: usize,

    /// Store name → image
    stores: Mutex<AssociativeMap<String, StoreImage>>,
}

impl MemoryByteStore {
    /// Create an empty backend where each store may hold `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            stores: Mutex::new(AssociativeMap::new()),
        }
    }

    /// Create an empty backend sized and tuned from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let stores = AssociativeMap::with_capacity_and_load_factor(
            config.map_initial_capacity,
            config.map_load_factor,
        )?;
        Ok(Self {
            capacity: config.store_capacity,
            stores: Mutex::new(stores),
        })
    }

    /// Per-store byte budget
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Install an image loaded from elsewhere, replacing any existing one
    pub(crate) fn insert_image(&self, name: String, image: StoreImage) {
        self.stores.lock().put(name, image);
    }

    /// Run `f` against the image of `name`
    pub(crate) fn with_image<T>(
        &self,
        name: &str,
        f: impl FnOnce(&StoreImage) -> Result<T>,
    ) -> Result<T> {
        let stores = self.stores.lock();
        let image = stores
            .get(name)
            .ok_or_else(|| RmsError::NotFound(name.to_string()))?;
        f(image)
    }

    /// Run `f` against the image of `name` mutably
    pub(crate) fn with_image_mut<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut StoreImage) -> Result<T>,
    ) -> Result<T> {
        let mut stores = self.stores.lock();
        let image = stores
            .get_mut(name)
            .ok_or_else(|| RmsError::NotFound(name.to_string()))?;
        f(image)
    }

    /// Apply `f` to a copy of the image of `name` and install the copy only
    /// once `commit` accepts it
    ///
    /// If either step fails the stored image is untouched.
    pub(crate) fn with_image_staged<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut StoreImage) -> Result<T>,
        commit: impl FnOnce(&StoreImage) -> Result<()>,
    ) -> Result<T> {
        let mut stores = self.stores.lock();
        let image = stores
            .get_mut(name)
            .ok_or_else(|| RmsError::NotFound(name.to_string()))?;

        let mut staged = image.clone();
        let result = f(&mut staged)?;
        commit(&staged)?;
        *image = staged;
        Ok(result)
    }
}

// =============================================================================
// Record Mutations
// =============================================================================

impl StoreImage {
    /// Append a record under the next id
    ///
    /// Fails with `Full` if `data` does not fit in `capacity`, or if the id
    /// space is exhausted. Nothing changes on failure.
    pub(crate) fn insert_record(&mut self, capacity: usize, data: &[u8]) -> Result<RecordId> {
        let available = capacity.saturating_sub(self.used_bytes);
        if data.len() > available {
            return Err(RmsError::Full {
                requested: data.len(),
                available,
            });
        }

        let id = self.next_id;
        // Running out of ids is as final as running out of space
        self.next_id = id.checked_add(1).ok_or(RmsError::Full {
            requested: data.len(),
            available,
        })?;
        self.records.insert(id, data.to_vec());
        self.used_bytes += data.len();
        self.touch();
        Ok(id)
    }

    /// Replace the bytes of an existing record
    pub(crate) fn replace_record(
        &mut self,
        capacity: usize,
        id: RecordId,
        data: &[u8],
    ) -> Result<()> {
        let old_len = self
            .records
            .get(&id)
            .map(Vec::len)
            .ok_or(RmsError::InvalidId(id))?;

        let available = capacity.saturating_sub(self.used_bytes);
        let growth = data.len().saturating_sub(old_len);
        if growth > available {
            return Err(RmsError::Full {
                requested: growth,
                available,
            });
        }

        self.records.insert(id, data.to_vec());
        self.used_bytes = self.used_bytes - old_len + data.len();
        self.touch();
        Ok(())
    }

    /// Remove a record; `next_id` is left alone
    pub(crate) fn remove_record(&mut self, id: RecordId) -> Result<()> {
        let removed = self.records.remove(&id).ok_or(RmsError::InvalidId(id))?;
        self.used_bytes -= removed.len();
        self.touch();
        Ok(())
    }
}

impl ByteStore for MemoryByteStore {
    fn open(&self, name: &str, create_if_absent: bool) -> Result<StoreHandle> {
        let mut stores = self.stores.lock();
        if !stores.contains_key(name) {
            if !create_if_absent {
                return Err(RmsError::NotFound(name.to_string()));
            }
            stores.put(name.to_string(), StoreImage::new());
            info!(store = name, "created record store");
        }
        Ok(StoreHandle::new(name))
    }

    fn list(&self) -> Result<Vec<String>> {
        let stores = self.stores.lock();
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete_store(&self, name: &str) -> Result<()> {
        self.stores
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RmsError::NotFound(name.to_string()))
    }

    fn add(&self, handle: &StoreHandle, data: &[u8]) -> Result<RecordId> {
        let capacity = self.capacity;
        self.with_image_mut(handle.name(), |image| image.insert_record(capacity, data))
    }

    fn get(&self, handle: &StoreHandle, id: RecordId) -> Result<Vec<u8>> {
        self.with_image(handle.name(), |image| {
            image
                .records
                .get(&id)
                .cloned()
                .ok_or(RmsError::InvalidId(id))
        })
    }

    fn contains(&self, handle: &StoreHandle, id: RecordId) -> Result<bool> {
        self.with_image(handle.name(), |image| Ok(image.records.contains_key(&id)))
    }

    fn set(&self, handle: &StoreHandle, id: RecordId, data: &[u8]) -> Result<()> {
        let capacity = self.capacity;
        self.with_image_mut(handle.name(), |image| {
            image.replace_record(capacity, id, data)
        })
    }

    fn delete(&self, handle: &StoreHandle, id: RecordId) -> Result<()> {
        self.with_image_mut(handle.name(), |image| image.remove_record(id))
    }

    fn count(&self, handle: &StoreHandle) -> Result<usize> {
        self.with_image(handle.name(), |image| Ok(image.records.len()))
    }

    fn used_bytes(&self, handle: &StoreHandle) -> Result<usize> {
        self.with_image(handle.name(), |image| Ok(image.used_bytes))
    }

    fn free_bytes(&self, handle: &StoreHandle) -> Result<usize> {
        let capacity = self.capacity;
        self.with_image(handle.name(), |image| {
            Ok(capacity.saturating_sub(image.used_bytes))
        })
    }

    fn ids(&self, handle: &StoreHandle) -> Result<Vec<RecordId>> {
        self.with_image(handle.name(), |image| {
            Ok(image.records.keys().copied().collect())
        })
    }

    fn next_id(&self, handle: &StoreHandle) -> Result<RecordId> {
        self.with_image(handle.name(), |image| Ok(image.next_id))
    }

    fn version(&self, handle: &StoreHandle) -> Result<u32> {
        self.with_image(handle.name(), |image| Ok(image.version))
    }

    fn last_modified(&self, handle: &StoreHandle) -> Result<u64> {
        self.with_image(handle.name(), |image| Ok(image.last_modified_ms))
    }

    fn close(&self, handle: &StoreHandle) -> Result<()> {
        self.with_image(handle.name(), |_| Ok(()))
    }
}

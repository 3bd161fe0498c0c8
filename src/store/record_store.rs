//! Record Store handle
//!
//! CRUD and accounting over one named store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::MutexGuard;
use tracing::{debug, warn};

use crate::backend::RecordId;
use crate::error::{Result, RmsError};
use crate::view::{RecordComparator, RecordFilter, RecordView};

use super::manager::{SharedStore, TableInner};

/// An open handle on a named record store
///
/// ## Concurrency Model
///
/// - Every operation takes the per-name store lock, so mutations are
///   linearizable across all handles and threads, and reads never observe
///   a partially applied mutation.
/// - Clones share one handle: closing any clone closes them all. Handles
///   obtained from separate `StoreTable::open_store` calls are independent.
/// - A handle still open when its last clone is dropped is closed then.
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<Handle>,
}

struct Handle {
    table: Arc<TableInner>,
    shared: Arc<SharedStore>,
    open: AtomicBool,
}

impl RecordStore {
    pub(crate) fn new(table: Arc<TableInner>, shared: Arc<SharedStore>) -> Self {
        Self {
            inner: Arc::new(Handle {
                table,
                shared,
                open: AtomicBool::new(true),
            }),
        }
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Append a record and return its id
    ///
    /// Ids are strictly increasing over the store's whole lifetime; ids of
    /// deleted records are never handed out again.
    pub fn add_record(&self, data: &[u8]) -> Result<RecordId> {
        let _guard = self.lock()?;
        let shared = self.shared();

        let id = shared.backend.add(&shared.handle, data)?;
        self.mark_mutated();

        debug!(store = self.name(), id, len = data.len(), "added record");
        Ok(id)
    }

    /// Copy of the bytes stored under `id`
    pub fn get_record(&self, id: RecordId) -> Result<Vec<u8>> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.get(&shared.handle, id)
    }

    /// Replace the bytes stored under an existing `id`
    ///
    /// Size accounting moves by the length difference; the id is unchanged.
    pub fn set_record(&self, id: RecordId, data: &[u8]) -> Result<()> {
        let _guard = self.lock()?;
        let shared = self.shared();

        shared.backend.set(&shared.handle, id, data)?;
        self.mark_mutated();

        debug!(store = self.name(), id, len = data.len(), "replaced record");
        Ok(())
    }

    /// Remove a record; its id is retired permanently
    pub fn delete_record(&self, id: RecordId) -> Result<()> {
        let _guard = self.lock()?;
        let shared = self.shared();

        shared.backend.delete(&shared.handle, id)?;
        self.mark_mutated();

        debug!(store = self.name(), id, "deleted record");
        Ok(())
    }

    /// Length of the record stored under `id`
    pub fn record_size(&self, id: RecordId) -> Result<usize> {
        self.get_record(id).map(|data| data.len())
    }

    /// Live record ids in ascending order
    pub fn record_ids(&self) -> Result<Vec<RecordId>> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.ids(&shared.handle)
    }

    // =========================================================================
    // Accounting
    // =========================================================================

    pub fn num_records(&self) -> Result<usize> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.count(&shared.handle)
    }

    /// Bytes used by record data
    pub fn size(&self) -> Result<usize> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.used_bytes(&shared.handle)
    }

    /// Bytes still available before `Full`
    pub fn size_available(&self) -> Result<usize> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.free_bytes(&shared.handle)
    }

    /// Id the next `add_record` will return
    pub fn next_record_id(&self) -> Result<RecordId> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.next_id(&shared.handle)
    }

    /// Mutation counter persisted with the store
    pub fn version(&self) -> Result<u32> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.version(&shared.handle)
    }

    /// Unix millis of the last mutation (0 if never modified)
    pub fn last_modified(&self) -> Result<u64> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.last_modified(&shared.handle)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn name(&self) -> &str {
        self.shared().handle.name()
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Close this handle; persisted data is kept
    ///
    /// Fails with `NotOpen` if the handle is already closed.
    pub fn close_store(&self) -> Result<()> {
        self.inner.table.release(&self.inner.shared, &self.inner.open)
    }

    /// Create a view over this store (see `RecordView::new`)
    pub fn enumerate_records(
        &self,
        filter: Option<Box<dyn RecordFilter>>,
        comparator: Option<Box<dyn RecordComparator>>,
        live: bool,
    ) -> Result<RecordView> {
        RecordView::new(self, filter, comparator, live)
    }

    // =========================================================================
    // View Support
    // =========================================================================

    /// Mutation generation of the underlying store
    pub(crate) fn generation(&self) -> u64 {
        self.shared().generation.load(Ordering::Acquire)
    }

    /// Visit every live record under the store lock
    ///
    /// Records that vanish between the id snapshot and the fetch are
    /// skipped. Returns the kept items and the generation they reflect.
    /// `visit` must not call back into this store.
    pub(crate) fn scan<T>(
        &self,
        mut visit: impl FnMut(RecordId, Vec<u8>) -> Option<T>,
    ) -> Result<(Vec<T>, u64)> {
        let _guard = self.lock()?;
        let shared = self.shared();

        let ids = shared.backend.ids(&shared.handle)?;
        let mut kept = Vec::with_capacity(ids.len());
        for id in ids {
            match shared.backend.get(&shared.handle, id) {
                Ok(data) => kept.extend(visit(id, data)),
                Err(RmsError::InvalidId(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok((kept, self.generation()))
    }

    /// Whether `id` currently refers to a live record
    pub(crate) fn contains_record(&self, id: RecordId) -> Result<bool> {
        let _guard = self.lock()?;
        let shared = self.shared();
        shared.backend.contains(&shared.handle, id)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn shared(&self) -> &SharedStore {
        &self.inner.shared
    }

    /// Take the store lock, failing if this handle is closed
    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        let guard = self.shared().lock.lock();
        if !self.is_open() {
            return Err(RmsError::NotOpen);
        }
        Ok(guard)
    }

    /// Called with the store lock held
    fn mark_mutated(&self) {
        self.shared().generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("name", &self.name())
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.open.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = self.table.release(&self.shared, &self.open) {
            warn!(store = self.shared.handle.name(), error = %e, "failed to close dropped handle");
        }
    }
}

//! Store Table
//!
//! Process-wide registry of open record stores.
//!
//! ## Responsibilities
//! - Create a shared store entry on the first open of a name
//! - Count open handles per name (advisory)
//! - Refuse deletion while any handle on the name is open
//! - Tear the entry down when its last handle closes

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::backend::{ByteStore, FileByteStore, MemoryByteStore, StoreHandle};
use crate::config::Config;
use crate::error::{Result, RmsError};
use crate::map::AssociativeMap;

use super::{RecordStore, MAX_NAME_LEN};

/// Registry of open stores over one byte store backend
///
/// Cloning is cheap; clones share the same registry. The table is an
/// explicit value: create one per backend and pass it to whoever opens
/// stores.
#[derive(Clone)]
pub struct StoreTable {
    inner: Arc<TableInner>,
}

/// State shared by a table and every handle it has issued
pub(crate) struct TableInner {
    config: Config,
    backend: Arc<dyn ByteStore>,
    /// Store name → shared store + open handle count
    open: Mutex<AssociativeMap<String, TableEntry>>,
}

struct TableEntry {
    shared: Arc<SharedStore>,
    handles: usize,
}

/// State shared by every open handle on one name
pub(crate) struct SharedStore {
    pub(crate) handle: StoreHandle,
    pub(crate) backend: Arc<dyn ByteStore>,
    /// Serializes all record operations and accounting queries on this store
    pub(crate) lock: Mutex<()>,
    /// Bumped (under `lock`) by every successful mutation
    pub(crate) generation: AtomicU64,
}

impl StoreTable {
    /// Create a table over an arbitrary backend
    pub fn new(config: Config, backend: Arc<dyn ByteStore>) -> Result<Self> {
        let open = AssociativeMap::with_capacity_and_load_factor(
            config.map_initial_capacity,
            config.map_load_factor,
        )?;
        Ok(Self {
            inner: Arc::new(TableInner {
                config,
                backend,
                open: Mutex::new(open),
            }),
        })
    }

    /// Create a table over a fresh in-memory backend
    pub fn in_memory(config: Config) -> Result<Self> {
        let backend = MemoryByteStore::from_config(&config)?;
        Self::new(config, Arc::new(backend))
    }

    /// Create a table over the image files in `config.data_dir`
    pub fn open_dir(config: Config) -> Result<Self> {
        let backend = FileByteStore::open(&config)?;
        info!(data_dir = %config.data_dir.display(), "opened record store directory");
        Self::new(config, Arc::new(backend))
    }

    /// Open a store by name
    ///
    /// Every call returns an independent handle that must be closed on its
    /// own; handles on the same name share the same records.
    pub fn open_store(&self, name: &str, create_if_absent: bool) -> Result<RecordStore> {
        validate_name(name)?;

        let mut table = self.inner.open.lock();

        if let Some(entry) = table.get_mut(name) {
            entry.handles += 1;
            debug!(store = name, handles = entry.handles, "opened record store handle");
            return Ok(RecordStore::new(
                Arc::clone(&self.inner),
                Arc::clone(&entry.shared),
            ));
        }

        let handle = self.inner.backend.open(name, create_if_absent)?;
        let shared = Arc::new(SharedStore {
            handle,
            backend: Arc::clone(&self.inner.backend),
            lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        });
        table.put(
            name.to_string(),
            TableEntry {
                shared: Arc::clone(&shared),
                handles: 1,
            },
        );
        debug!(store = name, handles = 1, "opened record store handle");

        Ok(RecordStore::new(Arc::clone(&self.inner), shared))
    }

    /// Delete a store and all of its records
    ///
    /// Fails with `InUse` while any handle on `name` is open, and with
    /// `NotFound` if no such store exists.
    pub fn delete_store(&self, name: &str) -> Result<()> {
        let table = self.inner.open.lock();

        if let Some(entry) = table.get(name) {
            return Err(RmsError::InUse(format!(
                "{} ({} open handle(s))",
                name, entry.handles
            )));
        }

        self.inner.backend.delete_store(name)?;
        info!(store = name, "record store deleted");
        Ok(())
    }

    /// Names of every known store; empty (not an error) when there are none
    pub fn list_stores(&self) -> Result<Vec<String>> {
        self.inner.backend.list()
    }

    /// Number of currently open handles on `name`
    pub fn open_handles(&self, name: &str) -> usize {
        self.inner
            .open
            .lock()
            .get(name)
            .map_or(0, |entry| entry.handles)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

impl TableInner {
    /// Close one handle on `shared`
    ///
    /// `open` is the handle's own flag; it is cleared under the store lock
    /// so no record operation can slip in after the close.
    pub(crate) fn release(&self, shared: &SharedStore, open: &AtomicBool) -> Result<()> {
        let mut table = self.open.lock();
        let _store = shared.lock.lock();

        if !open.swap(false, Ordering::AcqRel) {
            return Err(RmsError::NotOpen);
        }

        let name = shared.handle.name();
        let remaining = match table.get_mut(name) {
            Some(entry) => {
                entry.handles = entry.handles.saturating_sub(1);
                entry.handles
            }
            None => 0,
        };
        if remaining == 0 {
            table.remove(name);
        }

        self.backend.close(&shared.handle)?;
        debug!(store = name, handles = remaining, "closed record store handle");
        Ok(())
    }
}

/// Store names must be usable as file names on every backend
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_NAME_LEN
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0']);

    if valid {
        Ok(())
    } else {
        Err(RmsError::InvalidName(name.to_string()))
    }
}

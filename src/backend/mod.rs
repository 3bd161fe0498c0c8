//! Backend Module
//!
//! The persistent byte store that record stores delegate to.
//!
//! ## Responsibilities
//! - Durable named collections of id-addressed byte blobs
//! - Monotonic record id allocation per collection
//! - Capacity accounting (used / free bytes)
//! - Version and last-modified bookkeeping
//!
//! Reference counting of open handles is NOT a backend concern; the
//! store table in `crate::store` owns it.
//!
//! ## Image File Format (file backend)
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "RMS1" (4) | Version: u16 (2)                  │
//! │   BodyLen: u32 (4)  | BodyCRC: u32 (4)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Body (BodyLen bytes)                                    │
//! │   bincode-encoded StoreImage                            │
//! │   { next_id, version, last_modified_ms, used_bytes,     │
//! │     records: id → bytes (ascending id) }                │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod file;
mod image;
mod memory;

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use file::FileByteStore;
pub use image::{decode_image, encode_image, read_image, write_image};
pub use memory::MemoryByteStore;

/// Identifier of a record within its store (always > 0)
pub type RecordId = u32;

// =============================================================================
// Image Format Constants
// =============================================================================

/// Magic bytes identifying a store image file
pub const MAGIC: &[u8; 4] = b"RMS1";

/// Current image format version
pub const FORMAT_VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + BodyLen (4) + BodyCRC (4) = 14 bytes
pub const HEADER_SIZE: usize = 14;

/// Extension of image files inside the data directory
pub(crate) const IMAGE_EXTENSION: &str = "rms";

// =============================================================================
// Store Handle
// =============================================================================

/// Backend-level handle to one named store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreHandle {
    name: String,
}

impl StoreHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// Store Image
// =============================================================================

/// Complete contents of one store, as kept in memory and written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreImage {
    /// Id handed out by the next `add`; never decreases
    pub next_id: RecordId,
    /// Bumped by every mutation
    pub version: u32,
    /// Unix millis of the last mutation (0 if never modified)
    pub last_modified_ms: u64,
    /// Sum of record lengths
    pub used_bytes: usize,
    /// Live records in ascending id order
    pub records: BTreeMap<RecordId, Vec<u8>>,
}

impl StoreImage {
    /// An empty store whose first record will get id 1
    pub fn new() -> Self {
        Self {
            next_id: 1,
            version: 0,
            last_modified_ms: 0,
            used_bytes: 0,
            records: BTreeMap::new(),
        }
    }

    /// Record a mutation
    pub(crate) fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.last_modified_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
    }
}

impl Default for StoreImage {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Persistent Byte Store Capability
// =============================================================================

/// Durable named byte blobs, keyed by store name and record id
///
/// All calls are synchronous. A mutation that returns an error leaves the
/// store exactly as it was. Implementations must be safe to share across
/// threads; callers serialize mutations of one store themselves.
pub trait ByteStore: Send + Sync {
    /// Open `name`, creating an empty store if absent and `create_if_absent`
    ///
    /// Fails with `NotFound` if the store does not exist and may not be created.
    fn open(&self, name: &str, create_if_absent: bool) -> Result<StoreHandle>;

    /// Names of every known store (empty when there are none)
    fn list(&self) -> Result<Vec<String>>;

    /// Remove a store and all of its records (`NotFound` if absent)
    fn delete_store(&self, name: &str) -> Result<()>;

    /// Append a record, returning its freshly allocated id (`Full` if it does not fit)
    fn add(&self, handle: &StoreHandle, data: &[u8]) -> Result<RecordId>;

    /// Copy of a record's bytes (`InvalidId` if unknown or deleted)
    fn get(&self, handle: &StoreHandle, id: RecordId) -> Result<Vec<u8>>;

    /// Whether `id` names a live record, without copying it
    fn contains(&self, handle: &StoreHandle, id: RecordId) -> Result<bool>;

    /// Replace a record's bytes in place
    fn set(&self, handle: &StoreHandle, id: RecordId, data: &[u8]) -> Result<()>;

    /// Remove a record; its id is never handed out again
    fn delete(&self, handle: &StoreHandle, id: RecordId) -> Result<()>;

    fn count(&self, handle: &StoreHandle) -> Result<usize>;

    fn used_bytes(&self, handle: &StoreHandle) -> Result<usize>;

    fn free_bytes(&self, handle: &StoreHandle) -> Result<usize>;

    /// Live record ids in ascending (allocation) order
    fn ids(&self, handle: &StoreHandle) -> Result<Vec<RecordId>>;

    fn next_id(&self, handle: &StoreHandle) -> Result<RecordId>;

    fn version(&self, handle: &StoreHandle) -> Result<u32>;

    fn last_modified(&self, handle: &StoreHandle) -> Result<u64>;

    /// Release a handle; persisted data is kept
    fn close(&self, handle: &StoreHandle) -> Result<()>;
}

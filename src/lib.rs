//! # rmstore
//!
//! An embedded record store for small devices with:
//! - Named stores of id-addressed opaque byte records
//! - Monotonic record ids that are never reused
//! - Per-store capacity accounting
//! - Filtered, ordered record views with optional live tracking
//! - A separate-chaining hash map for in-process bookkeeping
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       StoreTable                             │
//! │          (open handles per name, advisory refcount)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ open_store(name)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      RecordStore                             │
//! │        (per-name lock, CRUD, accounting, generation)         │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │ scan / get
//!            ▼                                  │
//!   ┌─────────────────┐                 ┌───────┴───────┐
//!   │    ByteStore    │                 │  RecordView   │
//!   │ (memory / file) │                 │ filter + sort │
//!   └─────────────────┘                 └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use rmstore::{Config, RecordView, StoreTable};
//!
//! # fn main() -> rmstore::Result<()> {
//! let table = StoreTable::in_memory(Config::default())?;
//! let store = table.open_store("scores", true)?;
//! store.add_record(&[2, 9])?;
//! store.add_record(&[9])?;
//!
//! let mut view = RecordView::builder(&store)
//!     .filter(|data: &[u8]| data.first().map_or(false, |b| b % 2 == 0))
//!     .live(true)
//!     .build()?;
//! while view.has_next()? {
//!     println!("{:?}", view.next()?);
//! }
//! store.close_store()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod map;
pub mod backend;
pub mod store;
pub mod view;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RmsError, Result};
pub use config::{Config, SyncStrategy};
pub use backend::{ByteStore, RecordId};
pub use map::AssociativeMap;
pub use store::{RecordStore, StoreTable};
pub use view::{RecordComparator, RecordFilter, RecordView};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of rmstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

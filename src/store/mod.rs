//! Store Module
//!
//! Named record stores and the table that tracks who has them open.
//!
//! ## Responsibilities
//! - Open / create / list / delete stores by name
//! - Advisory reference counting of open handles per name
//! - One mutual-exclusion lock per store name; every record operation
//!   and accounting query runs under it
//! - A mutation generation counter per store, consumed by live views
//!
//! ## Lock Order
//! ```text
//!   table lock ──► store lock ──► backend internals
//! ```
//! Record operations take only the store lock. Open/close/delete take the
//! table lock first.

mod manager;
mod record_store;

pub use manager::StoreTable;
pub use record_store::RecordStore;

/// Longest accepted store name (in characters)
pub const MAX_NAME_LEN: usize = 32;

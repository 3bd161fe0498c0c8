//! Associative Map Module
//!
//! General-purpose hash map used for in-process bookkeeping.
//!
//! ## Responsibilities
//! - Key → value lookups with unique keys
//! - Bounded average chain length through load-factor driven growth
//! - Enumeration of keys and values over the current bucket array
//!
//! ## Data Structure Choice
//! Separate chaining over a bucket array:
//! ```text
//!   buckets[0] ──► (hash, key, value) ──► (hash, key, value) ──► ∅
//!   buckets[1] ──► ∅
//!   buckets[2] ──► (hash, key, value) ──► ∅
//!   ...
//! ```
//! - New entries are pushed at the head of their chain
//! - When `len >= load_factor * bucket_count` an insert first grows the
//!   array to `2 * bucket_count + 1` and relinks every entry (no reallocation
//!   of the entries themselves)
//! - Removal never shrinks the array

mod iter;
mod table;

pub use iter::{Iter, Keys, Values};
pub use table::AssociativeMap;

/// Bucket count used by `AssociativeMap::new`
pub const DEFAULT_CAPACITY: usize = 11;

/// Load factor used unless one is given explicitly
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

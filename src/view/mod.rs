//! View Module
//!
//! Filtered, ordered cursors over the record ids of one store.
//!
//! ## Responsibilities
//! - Select records with a caller-supplied filter
//! - Order them with a caller-supplied three-way comparator (stable)
//! - Bidirectional traversal by id or by record bytes
//! - Optional live tracking: refresh before traversal whenever the store
//!   has mutated since the last rebuild
//!
//! ## Cursor Model
//! ```text
//!   ids:      [ 7 ][ 3 ][ 9 ]
//!   cursor: 0    1    2    3
//!           ▲              ▲
//!     before first     after last
//! ```
//! `next` yields `ids[cursor]` and advances; `previous` steps back and
//! yields `ids[cursor]`. Ids whose records were deleted after the snapshot
//! are skipped in both directions.
//!
//! A view never mutates its store. It is not internally synchronized:
//! confine it to one thread or wrap it in a lock.

mod enumeration;

use std::cmp::Ordering;

pub use enumeration::{RecordView, ViewBuilder};

/// Boolean test over a record's bytes
pub trait RecordFilter: Send + Sync {
    fn matches(&self, candidate: &[u8]) -> bool;
}

impl<F> RecordFilter for F
where
    F: Fn(&[u8]) -> bool + Send + Sync,
{
    fn matches(&self, candidate: &[u8]) -> bool {
        self(candidate)
    }
}

/// Three-way comparison between two records' bytes
///
/// `Less` means the first record precedes the second, `Equal` that they are
/// equivalent, `Greater` that it follows.
pub trait RecordComparator: Send + Sync {
    fn compare(&self, first: &[u8], second: &[u8]) -> Ordering;
}

impl<F> RecordComparator for F
where
    F: Fn(&[u8], &[u8]) -> Ordering + Send + Sync,
{
    fn compare(&self, first: &[u8], second: &[u8]) -> Ordering {
        self(first, second)
    }
}

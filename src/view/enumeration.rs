//! RecordView implementation
//!
//! Snapshot-and-filter rebuild, stable sort, and a skip-tolerant cursor.

use tracing::debug;

use crate::backend::RecordId;
use crate::error::{Result, RmsError};
use crate::map::AssociativeMap;
use crate::store::RecordStore;

use super::{RecordComparator, RecordFilter};

/// A filtered, ordered cursor over a store's record ids
pub struct RecordView {
    /// `None` once destroyed
    store: Option<RecordStore>,
    filter: Option<Box<dyn RecordFilter>>,
    comparator: Option<Box<dyn RecordComparator>>,
    live: bool,
    /// Ordered id list from the last rebuild
    ids: Vec<RecordId>,
    /// Number of ids before the cursor
    cursor: usize,
    /// Store generation the id list reflects
    generation: u64,
}

impl RecordView {
    /// Create a view and build its id list immediately
    ///
    /// Without a filter every record matches; without a comparator ids keep
    /// store order (ascending id).
    pub fn new(
        store: &RecordStore,
        filter: Option<Box<dyn RecordFilter>>,
        comparator: Option<Box<dyn RecordComparator>>,
        live: bool,
    ) -> Result<Self> {
        let mut view = Self {
            store: Some(store.clone()),
            filter,
            comparator,
            live,
            ids: Vec::new(),
            cursor: 0,
            generation: 0,
        };
        view.rebuild()?;
        Ok(view)
    }

    /// Start building a view over `store`
    pub fn builder(store: &RecordStore) -> ViewBuilder<'_> {
        ViewBuilder::new(store)
    }

    // =========================================================================
    // Rebuild
    // =========================================================================

    /// Recompute the id list from the store's current contents
    ///
    /// Resets the cursor to before the first element.
    pub fn rebuild(&mut self) -> Result<()> {
        let (ids, generation) = self.collect_ids()?;
        self.ids = ids;
        self.generation = generation;
        self.cursor = 0;
        Ok(())
    }

    /// Snapshot, filter, and order the store's ids
    ///
    /// The snapshot-and-filter pass runs under the store lock. Sorting uses
    /// a stable sort, so equivalent records keep their store order and
    /// unchanged data always rebuilds to the same list.
    fn collect_ids(&self) -> Result<(Vec<RecordId>, u64)> {
        let store = self.store()?;
        let filter = self.filter.as_deref();
        let keep = |data: &[u8]| filter.map_or(true, |f| f.matches(data));

        let (ids, generation) = match self.comparator.as_deref() {
            Some(comparator) => {
                let (mut matches, generation) =
                    store.scan(|id, data| keep(data.as_slice()).then_some((id, data)))?;
                matches.sort_by(|(_, a), (_, b)| comparator.compare(a, b));
                (matches.into_iter().map(|(id, _)| id).collect(), generation)
            }
            None => store.scan(|id, data| keep(data.as_slice()).then_some(id))?,
        };

        debug!(
            store = store.name(),
            matched = ids.len(),
            generation,
            "rebuilt record view"
        );
        Ok((ids, generation))
    }

    /// Refresh a live view if the store mutated since the last rebuild
    ///
    /// Unlike `rebuild`, the cursor keeps its place: it lands just after
    /// the last id before it that survived the refresh, or before the first
    /// element when none did.
    fn refresh_if_stale(&mut self) -> Result<()> {
        let store = self.store()?;
        if !self.live || store.generation() == self.generation {
            return Ok(());
        }

        let (ids, generation) = self.collect_ids()?;

        let mut positions = AssociativeMap::with_capacity(ids.len() * 2 + 1);
        for (pos, &id) in ids.iter().enumerate() {
            positions.put(id, pos);
        }
        self.cursor = self.ids[..self.cursor]
            .iter()
            .rev()
            .find_map(|id| positions.get(id))
            .map_or(0, |&pos| pos + 1);

        self.ids = ids;
        self.generation = generation;
        Ok(())
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    pub fn has_next(&mut self) -> Result<bool> {
        self.refresh_if_stale()?;
        Ok(self.peek_next()?.is_some())
    }

    pub fn has_previous(&mut self) -> Result<bool> {
        self.refresh_if_stale()?;
        Ok(self.peek_previous()?.is_some())
    }

    /// Advance and return the next record's bytes
    pub fn next(&mut self) -> Result<Vec<u8>> {
        self.refresh_if_stale()?;

        while self.cursor < self.ids.len() {
            let fetched = self.store()?.get_record(self.ids[self.cursor]);
            match fetched {
                Ok(data) => {
                    self.cursor += 1;
                    return Ok(data);
                }
                // Deleted since the snapshot
                Err(RmsError::InvalidId(_)) => self.cursor += 1,
                Err(e) => return Err(e),
            }
        }

        Err(RmsError::NoSuchElement)
    }

    /// Step back and return the previous record's bytes
    pub fn previous(&mut self) -> Result<Vec<u8>> {
        self.refresh_if_stale()?;

        while self.cursor > 0 {
            let fetched = self.store()?.get_record(self.ids[self.cursor - 1]);
            match fetched {
                Ok(data) => {
                    self.cursor -= 1;
                    return Ok(data);
                }
                Err(RmsError::InvalidId(_)) => self.cursor -= 1,
                Err(e) => return Err(e),
            }
        }

        Err(RmsError::NoSuchElement)
    }

    /// Advance and return the next record's id
    pub fn next_id(&mut self) -> Result<RecordId> {
        self.refresh_if_stale()?;

        let pos = self.peek_next()?.ok_or(RmsError::NoSuchElement)?;
        self.cursor = pos + 1;
        Ok(self.ids[pos])
    }

    /// Step back and return the previous record's id
    pub fn previous_id(&mut self) -> Result<RecordId> {
        self.refresh_if_stale()?;

        let pos = self.peek_previous()?.ok_or(RmsError::NoSuchElement)?;
        self.cursor = pos;
        Ok(self.ids[pos])
    }

    /// Move the cursor before the first element without rebuilding
    pub fn reset(&mut self) -> Result<()> {
        self.store()?;
        self.cursor = 0;
        Ok(())
    }

    /// Number of ids in the current list (refreshed first when live)
    ///
    /// A non-live view counts its snapshot, including ids deleted since.
    pub fn count(&mut self) -> Result<usize> {
        self.refresh_if_stale()?;
        Ok(self.ids.len())
    }

    // =========================================================================
    // Mode / Lifecycle
    // =========================================================================

    /// Enable or disable live tracking
    ///
    /// Enabling rebuilds immediately; disabling freezes the current list.
    pub fn set_live_tracking(&mut self, enabled: bool) -> Result<()> {
        self.store()?;
        self.live = enabled;
        if enabled {
            self.rebuild()?;
        }
        Ok(())
    }

    pub fn is_live_tracking(&self) -> Result<bool> {
        self.store()?;
        Ok(self.live)
    }

    /// Release the view; every later call fails with `Destroyed`
    pub fn destroy(&mut self) -> Result<()> {
        self.store.take().ok_or(RmsError::Destroyed)?;
        self.filter = None;
        self.comparator = None;
        self.ids = Vec::new();
        self.cursor = 0;
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.store.is_none()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn store(&self) -> Result<&RecordStore> {
        self.store.as_ref().ok_or(RmsError::Destroyed)
    }

    /// Position of the first live id at or after the cursor
    fn peek_next(&self) -> Result<Option<usize>> {
        let store = self.store()?;
        for pos in self.cursor..self.ids.len() {
            if store.contains_record(self.ids[pos])? {
                return Ok(Some(pos));
            }
        }
        Ok(None)
    }

    /// Position of the last live id before the cursor
    fn peek_previous(&self) -> Result<Option<usize>> {
        let store = self.store()?;
        for pos in (0..self.cursor).rev() {
            if store.contains_record(self.ids[pos])? {
                return Ok(Some(pos));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for RecordView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordView")
            .field("store", &self.store)
            .field("live", &self.live)
            .field("ids", &self.ids)
            .field("cursor", &self.cursor)
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for RecordView
pub struct ViewBuilder<'a> {
    store: &'a RecordStore,
    filter: Option<Box<dyn RecordFilter>>,
    comparator: Option<Box<dyn RecordComparator>>,
    live: bool,
}

impl<'a> ViewBuilder<'a> {
    fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            filter: None,
            comparator: None,
            live: false,
        }
    }

    /// Keep only records the filter matches
    pub fn filter(mut self, filter: impl RecordFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Order records with the comparator
    pub fn comparator(mut self, comparator: impl RecordComparator + 'static) -> Self {
        self.comparator = Some(Box::new(comparator));
        self
    }

    /// Enable live tracking
    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn build(self) -> Result<RecordView> {
        RecordView::new(self.store, self.filter, self.comparator, self.live)
    }
}

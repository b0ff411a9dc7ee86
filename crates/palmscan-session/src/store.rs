//! Region store and per-session state.

use palmscan_core::{Detection, DetectionRecord, Drawing, Region, SessionError, SessionResult};

/// Ordered, append-only collection of processed regions
///
/// The only way to remove a region is [`RegionStore::reset`], which clears
/// everything.
#[derive(Debug, Clone)]
pub struct RegionStore<D = DetectionRecord> {
    regions: Vec<Region<D>>,
}

impl<D> Default for RegionStore<D> {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
        }
    }
}

impl<D: Detection> RegionStore<D> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every region.
    ///
    /// Returns the number of regions dropped. Any overlay rendered from the
    /// previous contents is stale afterwards.
    pub fn reset(&mut self) -> usize {
        let dropped = self.regions.len();
        self.regions.clear();
        dropped
    }

    /// Append a region at the end.
    ///
    /// Fails if a region with the same raw drawing is already stored.
    pub fn append(&mut self, region: Region<D>) -> SessionResult<()> {
        if self.contains(region.drawing()) {
            return Err(SessionError::invariant(format!(
                "drawing for region {} is already stored",
                region.id()
            )));
        }
        self.regions.push(region);
        Ok(())
    }

    /// Read-only view of the regions, oldest first
    pub fn snapshot(&self) -> &[Region<D>] {
        &self.regions
    }

    /// Check whether a drawing has already been turned into a region
    pub fn contains(&self, drawing: &Drawing) -> bool {
        self.regions.iter().any(|r| r.drawing() == drawing)
    }

    /// Most recently appended region
    pub fn last(&self) -> Option<&Region<D>> {
        self.regions.last()
    }

    /// Number of stored regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True when no region is stored
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// State owned by one user session
///
/// Pairs the region store with the last drawing snapshot the session
/// completed a cycle for. Sessions never share state.
#[derive(Debug, Clone)]
pub struct SessionState<D = DetectionRecord> {
    store: RegionStore<D>,
    last_seen: Vec<Drawing>,
}

impl<D> Default for SessionState<D> {
    fn default() -> Self {
        Self {
            store: RegionStore::default(),
            last_seen: Vec::new(),
        }
    }
}

impl<D: Detection> SessionState<D> {
    /// Fresh state for a new session
    pub fn new() -> Self {
        Self::default()
    }

    /// Region store
    pub fn store(&self) -> &RegionStore<D> {
        &self.store
    }

    /// Mutable region store
    pub fn store_mut(&mut self) -> &mut RegionStore<D> {
        &mut self.store
    }

    /// Drawing snapshot of the last completed cycle
    pub fn last_seen(&self) -> &[Drawing] {
        &self.last_seen
    }

    /// Remember the snapshot a cycle completed for
    pub fn observe(&mut self, drawings: &[Drawing]) {
        if self.last_seen.as_slice() != drawings {
            self.last_seen = drawings.to_vec();
        }
    }

    /// Drop all regions and the remembered snapshot
    pub fn clear(&mut self) {
        self.store.reset();
        self.last_seen.clear();
    }
}

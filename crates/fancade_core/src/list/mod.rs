//! # Prefab List
//!
//! The list owns every custom prefab of a game and the flat segment ID space
//! they share.
//!
//! ## ID Space
//!
//! IDs below `id_offset` belong to the stock catalog. Custom segments take
//! consecutive IDs from `id_offset` upward: a prefab's ID is the ID of its
//! main segment and its other segments follow it directly. Any edit that
//! changes the number of segments renumbers everything after the edit point,
//! including every grid cell that refers to those IDs.
//!
//! `0xFFFF` is never handed out; the codec uses it as the "no group" marker.
//!
//! Besides the prefab map the list keeps a flat segment index: slot `i`
//! names the prefab owning ID `id_offset + i`. Segment data stays inside
//! its prefab, so lookups by ID go through the index and then the owner.
//!
//! ## Generations
//!
//! Every mutation bumps `version`. A `BlockInstancesCache` records the
//! version it was built against and refuses to run against any other.

mod edit;
mod handle;
mod rewrite;

pub use handle::PrefabMut;
pub(crate) use rewrite::{CellWrite, Rekey};

use std::collections::BTreeMap;

use crate::cache::BlockInstancesCache;
use crate::error::{PrefabError, PrefabResult};
use crate::prefab::{Prefab, SegmentMap};
use crate::segment::PrefabSegment;

/// Number of stock blocks; the first custom ID of a current save.
pub const DEFAULT_ID_OFFSET: u16 = 597;

/// Highest ID a custom segment can take.
pub const MAX_SEGMENT_ID: u16 = u16::MAX - 1;

/// All custom prefabs of a game, keyed by prefab ID.
#[derive(Clone, Debug)]
pub struct PrefabList {
    /// First custom segment ID.
    id_offset: u16,
    /// Prefabs by ID, ascending.
    prefabs: BTreeMap<u16, Prefab>,
    /// Owning prefab of every segment; slot `i` is ID `id_offset + i`.
    owners: Vec<u16>,
    /// Generation counter, bumped on every mutation.
    version: u64,
}

impl PrefabList {
    /// Creates an empty list whose first custom ID is `id_offset`.
    #[must_use]
    pub fn new(id_offset: u16) -> Self {
        Self {
            id_offset,
            prefabs: BTreeMap::new(),
            owners: Vec::new(),
            version: 0,
        }
    }

    /// Builds a list by adding `prefabs` in order.
    ///
    /// # Errors
    ///
    /// Fails like [`PrefabList::add_prefab`].
    pub fn from_prefabs(id_offset: u16, prefabs: impl IntoIterator<Item = Prefab>) -> PrefabResult<Self> {
        let mut list = Self::new(id_offset);
        for prefab in prefabs {
            list.add_prefab(prefab)?;
        }
        Ok(list)
    }

    /// First custom segment ID.
    #[inline]
    #[must_use]
    pub const fn id_offset(&self) -> u16 {
        self.id_offset
    }

    /// Total number of segments.
    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.owners.len()
    }

    /// Number of prefabs.
    #[inline]
    #[must_use]
    pub fn prefab_count(&self) -> usize {
        self.prefabs.len()
    }

    /// Returns true if the list holds no prefabs.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }

    /// ID the next appended prefab will get.
    #[inline]
    #[must_use]
    pub fn next_id(&self) -> u16 {
        // check_capacity keeps id_offset + segment_count <= u16::MAX
        self.id_offset + self.owners.len() as u16
    }

    /// Current generation.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Prefabs in ID order.
    pub fn prefabs(&self) -> impl DoubleEndedIterator<Item = &Prefab> + ExactSizeIterator + '_ {
        self.prefabs.values()
    }

    /// Prefab with ID `id`.
    #[must_use]
    pub fn prefab(&self, id: u16) -> Option<&Prefab> {
        self.prefabs.get(&id)
    }

    /// Metadata and content editor for the prefab with ID `id`.
    ///
    /// Handing out the editor counts as a mutation, so caches built before
    /// it become stale.
    pub fn prefab_mut(&mut self, id: u16) -> Option<PrefabMut<'_>> {
        let prefab = self.prefabs.get_mut(&id)?;
        self.version += 1;
        Some(PrefabMut::new(prefab))
    }

    /// Prefab that owns the segment with ID `id`.
    #[must_use]
    pub fn owner_of(&self, id: u16) -> Option<&Prefab> {
        let slot = usize::from(id.checked_sub(self.id_offset)?);
        self.prefabs.get(self.owners.get(slot)?)
    }

    /// Segment with ID `id`.
    #[must_use]
    pub fn segment(&self, id: u16) -> Option<&PrefabSegment> {
        let prefab = self.owner_of(id)?;
        prefab.ordered_segments().nth(usize::from(id - prefab.id()))
    }

    /// Every segment paired with its ID, in ID order.
    pub fn segments(&self) -> impl Iterator<Item = (u16, &PrefabSegment)> + '_ {
        self.prefabs.values().flat_map(Prefab::enumerate_with_id)
    }

    /// Appends `prefab`, giving it the next free ID.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPrefab` for a prefab without segments and
    /// `IdSpaceExhausted` when its segments do not fit below `0xFFFF`.
    pub fn add_prefab(&mut self, mut prefab: Prefab) -> PrefabResult<u16> {
        if prefab.is_empty() {
            return Err(PrefabError::EmptyPrefab);
        }
        let count = prefab.segment_count();
        self.check_capacity(0, count)?;

        let id = self.next_id();
        prefab.set_id(id);
        self.prefabs.insert(id, prefab);
        self.owners.extend(std::iter::repeat(id).take(count));
        self.version += 1;

        tracing::trace!("Added prefab {} ({} segments)", id, count);
        Ok(id)
    }

    /// Inserts `prefab` at `id`, pushing the prefab at `id` and everything
    /// after it up by the new prefab's segment count.
    ///
    /// `id == next_id()` appends.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInsertId` unless `id` is an existing prefab ID or the
    /// next free ID, plus the errors of [`PrefabList::add_prefab`].
    pub fn insert_prefab(&mut self, id: u16, mut prefab: Prefab) -> PrefabResult<()> {
        let next_id = self.next_id();
        if id == next_id {
            return self.add_prefab(prefab).map(|_| ());
        }
        if !self.prefabs.contains_key(&id) {
            return Err(PrefabError::InvalidInsertId { id, next_id });
        }
        if prefab.is_empty() {
            return Err(PrefabError::EmptyPrefab);
        }
        let count = prefab.segment_count();
        self.check_capacity(0, count)?;

        self.increase_after(id, count as u16);
        prefab.set_id(id);
        self.prefabs.insert(id, prefab);
        self.reindex();
        self.version += 1;

        tracing::debug!("Inserted prefab {} ({} segments), shifted {} prefabs", id, count, self.prefabs.range(id + 1..).count());
        Ok(())
    }

    /// Removes the prefab with ID `id` and every grid reference to it, then
    /// closes the gap in the ID space.
    ///
    /// Every grid is swept for the removed IDs, so cells outside whole
    /// instances are cleared too. A cache for `id` is only validated; it is
    /// consumed because the prefab it tracks no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `PrefabNotFound` for an unknown ID, or `StaleCache` /
    /// `CacheMismatch` for a cache that does not fit this list and prefab.
    pub fn remove_prefab(&mut self, id: u16, cache: Option<BlockInstancesCache>) -> PrefabResult<Prefab> {
        let prefab = self.prefabs.get(&id).ok_or(PrefabError::PrefabNotFound(id))?;
        let count = prefab.segment_count();
        let last = id + (count as u16 - 1);

        if let Some(cache) = &cache {
            cache.check(self, id)?;
        }
        self.remove_ids_from_prefabs(id..=last)?;

        let mut removed = self.prefabs.remove(&id).ok_or(PrefabError::PrefabNotFound(id))?;
        self.decrease_after(last + 1, count as u16);
        self.reindex();
        removed.set_id(0);
        self.version += 1;

        tracing::debug!("Removed prefab {} ({} segments)", id, count);
        Ok(removed)
    }

    /// Shifts every ID `>= id` (cells and prefab keys) up by `amount`.
    pub(crate) fn increase_after(&mut self, id: u16, amount: u16) {
        self.renumber(id, id, i32::from(amount));
    }

    /// Shifts every ID `>= id` (cells and prefab keys) down by `amount`.
    ///
    /// The `amount` IDs below `id` must already be unused.
    pub(crate) fn decrease_after(&mut self, id: u16, amount: u16) {
        self.renumber(id, id, -i32::from(amount));
    }

    /// Adds `delta` to every grid cell `>= cells_from` and re-keys every
    /// prefab whose ID is `>= prefabs_from`.
    pub(crate) fn renumber(&mut self, cells_from: u16, prefabs_from: u16, delta: i32) {
        if delta == 0 {
            return;
        }
        let shift = Rekey { from: cells_from, delta };
        for prefab in self.prefabs.values_mut() {
            prefab.blocks.map_occupied(|cell| shift.apply(cell));
        }

        let tail = self.prefabs.split_off(&prefabs_from);
        let moved = tail.len();
        for (id, mut prefab) in tail {
            let new_id = Rekey { from: prefabs_from, delta }.apply(id);
            prefab.set_id(new_id);
            self.prefabs.insert(new_id, prefab);
        }
        self.version += 1;

        tracing::trace!("Renumbered IDs >= {} by {} ({} prefabs re-keyed)", cells_from, delta, moved);
    }

    /// Fails unless the ID space can hold the current segments minus
    /// `removed` plus `added`.
    pub(crate) fn check_capacity(&self, removed: usize, added: usize) -> PrefabResult<()> {
        let total = self.owners.len() - removed + added;
        if usize::from(self.id_offset) + total > usize::from(MAX_SEGMENT_ID) + 1 {
            return Err(PrefabError::IdSpaceExhausted { requested: total });
        }
        Ok(())
    }

    /// Rebuilds the flat segment index from the prefab map.
    pub(crate) fn reindex(&mut self) {
        self.owners.clear();
        for (&id, prefab) in &self.prefabs {
            self.owners.extend(std::iter::repeat(id).take(prefab.segment_count()));
        }
    }
}

impl Default for PrefabList {
    fn default() -> Self {
        Self::new(DEFAULT_ID_OFFSET)
    }
}

impl PartialEq for PrefabList {
    /// Lists are equal when their content is; the generation is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.id_offset == other.id_offset && self.owners == other.owners && self.prefabs == other.prefabs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Byte3, Int3};

    fn seg(x: u8, y: u8, z: u8) -> PrefabSegment {
        PrefabSegment::new(Byte3::new(x, y, z), None).unwrap()
    }

    fn multi(name: &str, count: u8) -> Prefab {
        Prefab::with_segments(name, (0..count).map(|x| seg(x, 0, 0))).unwrap()
    }

    #[test]
    fn test_ids_are_consecutive() {
        let mut list = PrefabList::new(600);
        assert_eq!(list.add_prefab(multi("A", 2)).unwrap(), 600);
        assert_eq!(list.add_prefab(multi("B", 3)).unwrap(), 602);
        assert_eq!(list.next_id(), 605);

        let ids: Vec<_> = list.segments().map(|(id, s)| (id, s.prefab_id())).collect();
        assert_eq!(ids, vec![(600, 600), (601, 600), (602, 602), (603, 602), (604, 602)]);
        assert_eq!(list.owner_of(603).map(Prefab::id), Some(602));
        assert!(list.owner_of(605).is_none());
        assert!(list.owner_of(599).is_none());
    }

    #[test]
    fn test_insert_shifts_following_prefabs_and_cells() {
        let mut list = PrefabList::new(600);
        list.add_prefab(multi("A", 1)).unwrap();
        list.add_prefab(multi("B", 2)).unwrap();
        list.prefab_mut(600).unwrap().blocks_mut().set_block(Int3::ZERO, 601).unwrap();

        list.insert_prefab(601, multi("C", 2)).unwrap();

        assert_eq!(list.prefab(601).unwrap().name, "C");
        assert_eq!(list.prefab(603).unwrap().name, "B");
        assert_eq!(list.prefab(600).unwrap().blocks.get_block(Int3::ZERO), Ok(603));
        assert_eq!(list.segment(604).unwrap().prefab_id(), 603);
    }

    #[test]
    fn test_insert_rejects_segment_ids() {
        let mut list = PrefabList::new(600);
        list.add_prefab(multi("A", 3)).unwrap();
        assert_eq!(
            list.insert_prefab(601, multi("B", 1)),
            Err(PrefabError::InvalidInsertId { id: 601, next_id: 603 })
        );
        assert!(list.insert_prefab(603, multi("B", 1)).is_ok());
    }

    #[test]
    fn test_remove_prefab_closes_gap() {
        let mut list = PrefabList::new(600);
        list.add_prefab(multi("A", 2)).unwrap();
        list.add_prefab(multi("B", 2)).unwrap();
        list.add_prefab(multi("Host", 1)).unwrap();
        {
            let mut host = list.prefab_mut(604).unwrap();
            host.blocks_mut().set_block(Int3::new(0, 0, 0), 600).unwrap();
            host.blocks_mut().set_block(Int3::new(1, 0, 0), 601).unwrap();
            host.blocks_mut().set_block(Int3::new(0, 1, 0), 602).unwrap();
            host.blocks_mut().set_block(Int3::new(1, 1, 0), 603).unwrap();
        }

        let removed = list.remove_prefab(600, None).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(removed.id(), 0);

        let host = list.prefab(602).unwrap();
        assert_eq!(host.name, "Host");
        assert_eq!(host.blocks.get_block_or_default(Int3::new(0, 0, 0)), 0);
        assert_eq!(host.blocks.get_block_or_default(Int3::new(0, 1, 0)), 600);
        assert_eq!(host.blocks.get_block_or_default(Int3::new(1, 1, 0)), 601);
        assert_eq!(list.next_id(), 603);
    }

    #[test]
    fn test_segment_index_follows_structural_edits() {
        let mut list = PrefabList::new(600);
        list.add_prefab(multi("A", 2)).unwrap();
        list.add_prefab(multi("B", 3)).unwrap();
        list.insert_prefab(602, multi("C", 1)).unwrap();

        let owners: Vec<u16> = (600..606).map(|id| list.owner_of(id).unwrap().id()).collect();
        assert_eq!(owners, vec![600, 600, 602, 603, 603, 603]);

        list.remove_prefab(600, None).unwrap();
        let owners: Vec<u16> = (600..604).map(|id| list.owner_of(id).unwrap().id()).collect();
        assert_eq!(owners, vec![600, 601, 601, 601]);
        assert!(list.owner_of(604).is_none());
        assert_eq!(list.segment(603).unwrap().pos_in_prefab(), Byte3::new(2, 0, 0));
        assert_eq!(list.segment_count(), 4);
    }

    #[test]
    fn test_stock_references_survive_renumbering() {
        let mut list = PrefabList::new(600);
        list.add_prefab(multi("A", 1)).unwrap();
        list.prefab_mut(600).unwrap().blocks_mut().set_block(Int3::ZERO, 42).unwrap();
        list.insert_prefab(600, multi("B", 4)).unwrap();
        assert_eq!(list.prefab(604).unwrap().blocks.get_block(Int3::ZERO), Ok(42));
    }

    #[test]
    fn test_id_space_limit() {
        let mut list = PrefabList::new(MAX_SEGMENT_ID - 1);
        list.add_prefab(multi("A", 2)).unwrap();
        assert_eq!(list.next_id(), u16::MAX);
        assert_eq!(
            list.add_prefab(multi("B", 1)),
            Err(PrefabError::IdSpaceExhausted { requested: 3 })
        );
    }

    #[test]
    fn test_empty_prefab_rejected() {
        let mut list = PrefabList::default();
        assert_eq!(list.add_prefab(Prefab::new("Nothing")), Err(PrefabError::EmptyPrefab));
        assert_eq!(list.version(), 0);
    }

    #[test]
    fn test_equality_ignores_version() {
        let mut a = PrefabList::new(600);
        a.add_prefab(multi("A", 1)).unwrap();
        let b = a.clone();
        let _ = a.prefab_mut(600);
        assert_ne!(a.version(), b.version());
        assert_eq!(a, b);
    }
}

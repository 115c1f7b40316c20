//! # Block Instance Cache
//!
//! Reverse index from one prefab to every place it is used: for each grid
//! that contains the prefab, the positions of the cells holding its main
//! segment ID (its *anchors*).
//!
//! ## Staleness
//!
//! The cache stamps the list generation it was built or last updated
//! against. Every operation checks the stamp first and fails with
//! `StaleCache` instead of acting on outdated positions. Operations that
//! take the cache re-stamp it when they finish.
//!
//! ## Exactness
//!
//! Structural edits on `PrefabList` that take a cache leave it equal to a
//! fresh scan, stray and partial instances included: anchors are moved
//! with the edit and dropped where the edit overwrote them. Removing a
//! main segment promotes every cell of the next segment, so that edit
//! rescans instead.
//!
//! The block primitives below (`add_blocks`, `remove_blocks`,
//! `move_blocks`) only touch cells at `anchor + offset` and track the
//! anchors they write or clear.

use rayon::prelude::*;

use crate::error::{PrefabError, PrefabResult};
use crate::list::{CellWrite, PrefabList, Rekey};
use crate::math::Int3;
use crate::prefab::Prefab;

/// Anchors of one prefab inside the grid of another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceGroup {
    /// Prefab whose grid holds the anchors.
    pub prefab_id: u16,
    /// Anchor cells, in grid index order.
    pub positions: Vec<Int3>,
}

/// Cached instance positions of one prefab.
#[derive(Clone, Debug)]
pub struct BlockInstancesCache {
    /// Tracked prefab.
    id: u16,
    /// Groups in ascending owner order.
    groups: Vec<InstanceGroup>,
    /// List generation the groups are valid for.
    version: u64,
}

impl BlockInstancesCache {
    /// Scans every grid of `list` for instances of prefab `id`.
    ///
    /// Grids are scanned in parallel; the result keeps prefab order.
    #[must_use]
    pub fn new(list: &PrefabList, id: u16) -> Self {
        let prefabs: Vec<&Prefab> = list.prefabs().collect();
        let groups: Vec<InstanceGroup> = prefabs
            .par_iter()
            .filter_map(|prefab| {
                let positions = prefab.blocks.positions_of(id);
                (!positions.is_empty()).then(|| InstanceGroup {
                    prefab_id: prefab.id(),
                    positions,
                })
            })
            .collect();

        tracing::debug!(
            "Built instance cache for {}: {} instances in {} prefabs",
            id,
            groups.iter().map(|g| g.positions.len()).sum::<usize>(),
            groups.len()
        );
        Self {
            id,
            groups,
            version: list.version(),
        }
    }

    /// Tracked prefab ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Instance groups in ascending owner order.
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[InstanceGroup] {
        &self.groups
    }

    /// Returns true if the prefab is not placed anywhere.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(|g| g.positions.len()).sum()
    }

    /// List generation the cache is valid for.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns true if the cache can be used with `list`.
    #[must_use]
    pub fn is_valid_for(&self, list: &PrefabList) -> bool {
        self.version == list.version()
    }

    /// Writes `id` at `anchor + offset` for every cached instance.
    ///
    /// # Errors
    ///
    /// Returns `StaleCache`, or `OutOfBounds` before anything is written.
    pub fn add_block(&mut self, list: &mut PrefabList, offset: Int3, id: u16) -> PrefabResult<()> {
        self.add_blocks(list, &[(offset, id)])
    }

    /// Writes every `(offset, id)` item for every cached instance.
    ///
    /// # Errors
    ///
    /// See [`BlockInstancesCache::add_block`].
    pub fn add_blocks(&mut self, list: &mut PrefabList, items: &[(Int3, u16)]) -> PrefabResult<()> {
        self.check_version(list)?;
        if self.is_empty() {
            return Ok(());
        }
        let writes = list.write_instances(&self.groups, Rekey::NONE, items)?;
        self.apply_writes(&writes);
        self.stamp(list.version());
        Ok(())
    }

    /// Clears `anchor + offset` where it still holds `id`, for every cached
    /// instance. Returns the number of cleared cells.
    ///
    /// # Errors
    ///
    /// Returns `StaleCache`.
    pub fn remove_block(&mut self, list: &mut PrefabList, offset: Int3, id: u16) -> PrefabResult<usize> {
        self.remove_blocks(list, &[(offset, id)])
    }

    /// Clears every `(offset, id)` item for every cached instance.
    ///
    /// # Errors
    ///
    /// Returns `StaleCache`.
    pub fn remove_blocks(&mut self, list: &mut PrefabList, items: &[(Int3, u16)]) -> PrefabResult<usize> {
        self.check_version(list)?;
        if self.is_empty() {
            return Ok(0);
        }
        let writes = list.clear_instances(&self.groups, Rekey::NONE, items)?;
        self.apply_writes(&writes);
        self.stamp(list.version());
        Ok(writes.len())
    }

    /// Moves every `(offset, id)` item cell by `translation`, for every
    /// cached instance. Moving the anchor itself moves the cached position.
    ///
    /// # Errors
    ///
    /// Returns `StaleCache`, or `OutOfBounds` before anything is written.
    pub fn move_blocks(&mut self, list: &mut PrefabList, items: &[(Int3, u16)], translation: Int3) -> PrefabResult<()> {
        self.check_version(list)?;
        if self.is_empty() {
            return Ok(());
        }
        let writes = list.move_instances(&self.groups, items, translation)?;
        self.apply_writes(&writes);
        self.stamp(list.version());
        Ok(())
    }

    /// Checks that `anchor + offset` is addressable and empty for every
    /// cached instance.
    ///
    /// # Errors
    ///
    /// Returns `StaleCache`, `OutOfBounds` or the first `Obstructed` cell.
    pub fn can_add_block(&self, list: &PrefabList, offset: Int3) -> PrefabResult<()> {
        self.can_add_blocks(list, &[offset])
    }

    /// Like [`BlockInstancesCache::can_add_block`] for several offsets.
    ///
    /// # Errors
    ///
    /// See [`BlockInstancesCache::can_add_block`].
    pub fn can_add_blocks(&self, list: &PrefabList, offsets: &[Int3]) -> PrefabResult<()> {
        self.check_version(list)?;
        list.check_instances(&self.groups, offsets, &[], true)
    }

    /// Shifts every cached position by `translation` without touching any
    /// grid.
    pub fn translate(&mut self, translation: Int3) {
        if translation == Int3::ZERO {
            return;
        }
        for group in &mut self.groups {
            for pos in &mut group.positions {
                *pos += translation;
            }
        }
    }

    pub(crate) fn check_version(&self, list: &PrefabList) -> PrefabResult<()> {
        if self.version != list.version() {
            return Err(PrefabError::StaleCache {
                cache_version: self.version,
                list_version: list.version(),
            });
        }
        Ok(())
    }

    /// Fails unless the cache is current and tracks `id`.
    pub(crate) fn check(&self, list: &PrefabList, id: u16) -> PrefabResult<()> {
        self.check_version(list)?;
        if self.id != id {
            return Err(PrefabError::CacheMismatch {
                expected: id,
                actual: self.id,
            });
        }
        Ok(())
    }

    pub(crate) fn stamp(&mut self, version: u64) {
        self.version = version;
    }

    /// Follows a renumber of the list.
    pub(crate) fn rekey(&mut self, rekey: Rekey) {
        self.id = rekey.apply(self.id);
        for group in &mut self.groups {
            group.prefab_id = rekey.apply(group.prefab_id);
        }
    }

    /// Drops every cached position whose cell no longer holds the tracked
    /// ID.
    pub(crate) fn retain_present(&mut self, list: &PrefabList) {
        let id = self.id;
        self.groups.retain_mut(|group| {
            let Some(prefab) = list.prefab(group.prefab_id) else {
                return false;
            };
            group
                .positions
                .retain(|&pos| prefab.blocks.get_block_or_default(pos) == id);
            !group.positions.is_empty()
        });
    }

    pub(crate) fn rebuild(&mut self, list: &PrefabList) {
        *self = Self::new(list, self.id);
    }

    /// Tracks anchors created or destroyed by `writes`.
    pub(crate) fn apply_writes(&mut self, writes: &[CellWrite]) {
        for write in writes {
            if write.old == self.id {
                self.remove_anchor(write.prefab_id, write.pos);
            }
            if write.new == self.id {
                self.insert_anchor(write.prefab_id, write.pos);
            }
        }
    }

    fn remove_anchor(&mut self, prefab_id: u16, pos: Int3) {
        let Ok(g) = self.groups.binary_search_by_key(&prefab_id, |g| g.prefab_id) else {
            return;
        };
        let positions = &mut self.groups[g].positions;
        if let Ok(i) = positions.binary_search_by_key(&scan_key(pos), |&p| scan_key(p)) {
            positions.remove(i);
        }
        if positions.is_empty() {
            self.groups.remove(g);
        }
    }

    fn insert_anchor(&mut self, prefab_id: u16, pos: Int3) {
        let g = match self.groups.binary_search_by_key(&prefab_id, |g| g.prefab_id) {
            Ok(g) => g,
            Err(g) => {
                self.groups.insert(
                    g,
                    InstanceGroup {
                        prefab_id,
                        positions: Vec::new(),
                    },
                );
                g
            }
        };
        let positions = &mut self.groups[g].positions;
        if let Err(i) = positions.binary_search_by_key(&scan_key(pos), |&p| scan_key(p)) {
            positions.insert(i, pos);
        }
    }
}

/// Sort key matching grid index order (x fastest).
#[inline]
fn scan_key(pos: Int3) -> (i32, i32, i32) {
    (pos.z, pos.y, pos.x)
}

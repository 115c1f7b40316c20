//! Grid reference rewriting.
//!
//! Every rewrite works on a snapshot of *instances*: the grid cells that
//! hold the main segment ID of some prefab, grouped by the prefab whose grid
//! they are in. The brute-force entry points here take that snapshot by
//! scanning every grid; `BlockInstancesCache` hands in its own. Both then
//! run the same writes in the same order.

use std::borrow::Cow;
use std::ops::RangeBounds;

use super::PrefabList;
use crate::cache::{BlockInstancesCache, InstanceGroup};
use crate::error::{PrefabError, PrefabResult};
use crate::grid::MAX_GRID_COORD;
use crate::math::Int3;

/// Shift applied to IDs at or above `from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rekey {
    pub(crate) from: u16,
    pub(crate) delta: i32,
}

impl Rekey {
    /// The identity mapping.
    pub(crate) const NONE: Self = Self { from: u16::MAX, delta: 0 };

    #[inline]
    pub(crate) fn apply(self, id: u16) -> u16 {
        if self.delta != 0 && id >= self.from {
            (i32::from(id) + self.delta) as u16
        } else {
            id
        }
    }
}

/// One grid cell write made during a rewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CellWrite {
    pub(crate) prefab_id: u16,
    pub(crate) pos: Int3,
    pub(crate) old: u16,
    pub(crate) new: u16,
}

/// Fails if `pos` cannot be addressed by a grid.
pub(crate) fn check_cell(pos: Int3) -> PrefabResult<()> {
    if pos.any_negative() || pos.x > MAX_GRID_COORD || pos.y > MAX_GRID_COORD || pos.z > MAX_GRID_COORD {
        return Err(PrefabError::OutOfBounds { pos });
    }
    Ok(())
}

impl PrefabList {
    /// Every cell holding `id`, grouped by the prefab whose grid it is in.
    ///
    /// Groups come in ascending prefab order, positions in grid index order.
    #[must_use]
    pub fn find_instances(&self, id: u16) -> Vec<InstanceGroup> {
        self.prefabs
            .values()
            .filter_map(|prefab| {
                let positions = prefab.blocks.positions_of(id);
                (!positions.is_empty()).then(|| InstanceGroup {
                    prefab_id: prefab.id(),
                    positions,
                })
            })
            .collect()
    }

    /// Writes `id` at `anchor + offset` for every instance of `anchor_id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if any target cell is not addressable; nothing is
    /// written in that case.
    pub fn add_id_to_prefabs(&mut self, anchor_id: u16, offset: Int3, id: u16) -> PrefabResult<()> {
        self.add_ids_to_prefabs(anchor_id, &[(offset, id)])
    }

    /// Writes every `(offset, id)` item relative to every instance of
    /// `anchor_id`.
    ///
    /// # Errors
    ///
    /// See [`PrefabList::add_id_to_prefabs`].
    pub fn add_ids_to_prefabs(&mut self, anchor_id: u16, items: &[(Int3, u16)]) -> PrefabResult<()> {
        let groups = self.find_instances(anchor_id);
        self.write_instances(&groups, Rekey::NONE, items)?;
        Ok(())
    }

    /// Clears every cell holding `id`, returning how many were cleared.
    pub fn remove_id_from_prefabs(&mut self, id: u16) -> PrefabResult<usize> {
        self.remove_ids_from_prefabs(id..=id)
    }

    /// Clears every cell whose ID lies in `ids`, returning how many were
    /// cleared.
    pub fn remove_ids_from_prefabs(&mut self, ids: impl RangeBounds<u16>) -> PrefabResult<usize> {
        let matches = |cell: u16| ids.contains(&cell);
        let mut cleared = 0;
        for prefab in self.prefabs.values_mut() {
            cleared += prefab.blocks.clear_matching(&matches)?;
        }
        self.version += 1;
        Ok(cleared)
    }

    /// Moves the cells of every `(offset, id)` item by `translation`, relative
    /// to every instance of `anchor_id`. Cells that no longer hold their
    /// item's ID are left alone.
    ///
    /// # Errors
    ///
    /// See [`PrefabList::add_id_to_prefabs`].
    pub fn move_ids_in_prefabs(&mut self, anchor_id: u16, items: &[(Int3, u16)], translation: Int3) -> PrefabResult<()> {
        let groups = self.find_instances(anchor_id);
        self.move_instances(&groups, items, translation)?;
        Ok(())
    }

    /// Checks that `anchor + offset` is addressable and empty for every
    /// instance of `anchor_id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` or the first `Obstructed` cell found.
    pub fn can_add_id_to_prefabs(&self, anchor_id: u16, offset: Int3) -> PrefabResult<()> {
        self.can_add_ids_to_prefabs(anchor_id, &[offset])
    }

    /// Like [`PrefabList::can_add_id_to_prefabs`] for several offsets.
    ///
    /// # Errors
    ///
    /// See [`PrefabList::can_add_id_to_prefabs`].
    pub fn can_add_ids_to_prefabs(&self, anchor_id: u16, offsets: &[Int3]) -> PrefabResult<()> {
        let groups = self.find_instances(anchor_id);
        self.check_instances(&groups, offsets, &[], true)
    }

    /// Instance snapshot for `id`: borrowed from a valid cache, or scanned.
    pub(crate) fn instances_for<'c>(
        &self,
        id: u16,
        cache: Option<&'c BlockInstancesCache>,
    ) -> PrefabResult<Cow<'c, [InstanceGroup]>> {
        match cache {
            Some(cache) => {
                cache.check(self, id)?;
                Ok(Cow::Borrowed(cache.groups()))
            }
            None => Ok(Cow::Owned(self.find_instances(id))),
        }
    }

    /// Checks every `anchor + offset` target of every instance.
    ///
    /// Targets must be addressable. With `require_free`, they must also be
    /// empty unless their offset is in `vacated` (cells the instance itself
    /// gives up in the same edit).
    pub(crate) fn check_instances(
        &self,
        groups: &[InstanceGroup],
        offsets: &[Int3],
        vacated: &[Int3],
        require_free: bool,
    ) -> PrefabResult<()> {
        for group in groups {
            let Some(prefab) = self.prefabs.get(&group.prefab_id) else {
                continue;
            };
            for &anchor in &group.positions {
                for &offset in offsets {
                    let cell = anchor + offset;
                    check_cell(cell)?;
                    if require_free && !vacated.contains(&offset) && prefab.blocks.get_block_or_default(cell) != 0 {
                        return Err(PrefabError::Obstructed {
                            prefab_id: group.prefab_id,
                            prefab_name: prefab.name.clone(),
                            source_pos: anchor,
                            obstructed_pos: cell,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Writes every item relative to every instance. Owners are looked up
    /// through `rekey` so snapshots taken before a renumber stay usable.
    pub(crate) fn write_instances(
        &mut self,
        groups: &[InstanceGroup],
        rekey: Rekey,
        items: &[(Int3, u16)],
    ) -> PrefabResult<Vec<CellWrite>> {
        for group in groups {
            for &anchor in &group.positions {
                for &(offset, _) in items {
                    check_cell(anchor + offset)?;
                }
            }
        }

        let mut writes = Vec::new();
        for group in groups {
            let owner = rekey.apply(group.prefab_id);
            let Some(prefab) = self.prefabs.get_mut(&owner) else {
                continue;
            };
            for &anchor in &group.positions {
                for &(offset, id) in items {
                    let pos = anchor + offset;
                    let old = prefab.blocks.get_block_or_default(pos);
                    if old != id {
                        prefab.blocks.set_block(pos, id)?;
                        writes.push(CellWrite { prefab_id: owner, pos, old, new: id });
                    }
                }
            }
        }
        self.version += 1;
        Ok(writes)
    }

    /// Clears every item cell relative to every instance, where the cell
    /// still holds the item's ID.
    pub(crate) fn clear_instances(
        &mut self,
        groups: &[InstanceGroup],
        rekey: Rekey,
        items: &[(Int3, u16)],
    ) -> PrefabResult<Vec<CellWrite>> {
        let mut writes = Vec::new();
        for group in groups {
            let owner = rekey.apply(group.prefab_id);
            let Some(prefab) = self.prefabs.get_mut(&owner) else {
                continue;
            };
            for &anchor in &group.positions {
                for &(offset, id) in items {
                    let pos = anchor + offset;
                    if id != 0 && !pos.any_negative() && prefab.blocks.get_block_or_default(pos) == id {
                        prefab.blocks.set_block(pos, 0)?;
                        writes.push(CellWrite { prefab_id: owner, pos, old: id, new: 0 });
                    }
                }
            }
        }
        self.version += 1;
        Ok(writes)
    }

    /// Moves item cells by `translation`, one instance at a time.
    pub(crate) fn move_instances(
        &mut self,
        groups: &[InstanceGroup],
        items: &[(Int3, u16)],
        translation: Int3,
    ) -> PrefabResult<Vec<CellWrite>> {
        for group in groups {
            for &anchor in &group.positions {
                for &(offset, _) in items {
                    check_cell(anchor + offset + translation)?;
                }
            }
        }

        let mut writes = Vec::new();
        let mut moved = Vec::with_capacity(items.len());
        for group in groups {
            let Some(prefab) = self.prefabs.get_mut(&group.prefab_id) else {
                continue;
            };
            for &anchor in &group.positions {
                moved.clear();
                for &(offset, id) in items {
                    let pos = anchor + offset;
                    if id != 0 && !pos.any_negative() && prefab.blocks.get_block_or_default(pos) == id {
                        prefab.blocks.set_block(pos, 0)?;
                        writes.push(CellWrite { prefab_id: group.prefab_id, pos, old: id, new: 0 });
                        moved.push((pos + translation, id));
                    }
                }
                for &(pos, id) in &moved {
                    let old = prefab.blocks.get_block_or_default(pos);
                    prefab.blocks.set_block(pos, id)?;
                    writes.push(CellWrite { prefab_id: group.prefab_id, pos, old, new: id });
                }
            }
        }
        self.version += 1;
        Ok(writes)
    }
}

//! Structural prefab edits and placement.
//!
//! An instance of prefab `P` placed in some grid is addressed by its
//! *anchor*, the cell holding `P` itself. The instance origin is
//! `anchor - main.pos`, and segment `k` sits at `origin + pos_k` holding
//! `P + k`. Every edit below computes its cell changes as offsets from the
//! old anchor, checks them against all instances, and only then mutates.

use crate::cache::{BlockInstancesCache, InstanceGroup};
use crate::error::{PrefabError, PrefabResult};
use crate::math::{Byte3, Int3};
use crate::prefab::{Prefab, SegmentMap};
use crate::segment::PrefabSegment;

use super::rewrite::check_cell;
use super::{PrefabList, Rekey};

/// `(pos - base, id + k)` for every segment `k` of `prefab`.
pub(super) fn segment_items(prefab: &Prefab, base: Int3, id: u16) -> Vec<(Int3, u16)> {
    prefab
        .ordered_segments()
        .enumerate()
        .map(|(k, s)| (s.pos_i() - base, id + k as u16))
        .collect()
}

impl PrefabList {
    /// Replaces the prefab with ID `id` by `prefab`, keeping its ID and
    /// rewriting every placed instance to the new segment layout.
    ///
    /// Every target of the new layout must be addressable in every instance.
    /// Targets the old layout did not cover must also be empty, unless
    /// `overwrite_blocks` is set. Cells holding an old segment ID outside any
    /// instance are cleared.
    ///
    /// # Errors
    ///
    /// Returns `PrefabNotFound`, `EmptyPrefab`, `IdSpaceExhausted`,
    /// `OutOfBounds` or `Obstructed`, or a cache error. The list is unchanged
    /// on error.
    pub fn update_prefab(
        &mut self,
        id: u16,
        mut prefab: Prefab,
        overwrite_blocks: bool,
        mut cache: Option<&mut BlockInstancesCache>,
    ) -> PrefabResult<()> {
        let old = self.prefabs.get(&id).ok_or(PrefabError::PrefabNotFound(id))?;
        if prefab.is_empty() {
            return Err(PrefabError::EmptyPrefab);
        }
        let old_count = old.segment_count();
        let new_count = prefab.segment_count();
        self.check_capacity(old_count, new_count)?;

        let base = old.main_pos();
        let old_items = segment_items(old, base, id);
        let new_items = segment_items(&prefab, base, id);
        let targets: Vec<Int3> = new_items.iter().map(|&(offset, _)| offset).collect();
        let vacated: Vec<Int3> = old_items.iter().map(|&(offset, _)| offset).collect();
        let translation = prefab.main_pos() - base;
        let delta = new_count as i32 - old_count as i32;

        let groups = self.instances_for(id, cache.as_deref())?;
        self.check_instances(&groups, &targets, &vacated, !overwrite_blocks)?;

        self.clear_instances(&groups, Rekey::NONE, &old_items)?;
        self.remove_ids_from_prefabs(id..id + old_count as u16)?;
        self.prefabs.remove(&id);
        self.renumber(id + old_count as u16, id + 1, delta);
        prefab.set_id(id);
        self.prefabs.insert(id, prefab);
        self.reindex();

        let rekey = Rekey { from: id + 1, delta };
        self.write_instances(&groups, rekey, &new_items)?;
        let instances: usize = groups.iter().map(|g| g.positions.len()).sum();

        if let Some(cache) = cache.as_deref_mut() {
            cache.rekey(rekey);
            cache.translate(translation);
            cache.retain_present(self);
            cache.stamp(self.version);
        }

        tracing::debug!(
            "Updated prefab {} ({} -> {} segments, {} instances)",
            id,
            old_count,
            new_count,
            instances
        );
        Ok(())
    }

    /// [`PrefabList::update_prefab`], reporting only success.
    pub fn try_update_prefab(
        &mut self,
        id: u16,
        prefab: Prefab,
        overwrite_blocks: bool,
        cache: Option<&mut BlockInstancesCache>,
    ) -> bool {
        self.update_prefab(id, prefab, overwrite_blocks, cache).is_ok()
    }

    /// Adds `segment` to the prefab with ID `id` and places it in every
    /// instance. Returns the new segment's ID.
    ///
    /// The segment's ID follows the linear position order of its siblings;
    /// every ID from there on moves up by one.
    ///
    /// # Errors
    ///
    /// Returns `PrefabNotFound`, `InvalidSegmentPosition`, `SegmentOccupied`,
    /// `TooManySegments`, `IdSpaceExhausted`, `OutOfBounds` or `Obstructed`,
    /// or a cache error. The list is unchanged on error.
    pub fn add_segment_to_prefab(
        &mut self,
        id: u16,
        segment: PrefabSegment,
        overwrite_blocks: bool,
        mut cache: Option<&mut BlockInstancesCache>,
    ) -> PrefabResult<u16> {
        let prefab = self.prefabs.get(&id).ok_or(PrefabError::PrefabNotFound(id))?;
        prefab.check_insertable(&segment)?;
        self.check_capacity(0, 1)?;

        let base = prefab.main_pos();
        let offset = segment.pos_i() - base;
        let index = prefab.new_segment_index(segment.pos_in_prefab());
        let new_id = id + index as u16;
        let translation = if index == 0 { offset } else { Int3::ZERO };

        let groups = self.instances_for(id, cache.as_deref())?;
        self.check_instances(&groups, &[offset], &[], !overwrite_blocks)?;

        self.renumber(new_id, id + 1, 1);
        self.prefabs
            .get_mut(&id)
            .ok_or(PrefabError::PrefabNotFound(id))?
            .insert_segment(segment)?;
        self.reindex();

        let rekey = Rekey { from: id + 1, delta: 1 };
        self.write_instances(&groups, rekey, &[(offset, new_id)])?;

        if let Some(cache) = cache.as_deref_mut() {
            cache.rekey(rekey);
            cache.translate(translation);
            cache.retain_present(self);
            cache.stamp(self.version);
        }

        tracing::debug!("Added segment {} to prefab {} at ordinal {}", new_id, id, index);
        Ok(new_id)
    }

    /// [`PrefabList::add_segment_to_prefab`], reporting only success.
    pub fn try_add_segment_to_prefab(
        &mut self,
        id: u16,
        segment: PrefabSegment,
        overwrite_blocks: bool,
        cache: Option<&mut BlockInstancesCache>,
    ) -> bool {
        self.add_segment_to_prefab(id, segment, overwrite_blocks, cache).is_ok()
    }

    /// Removes the segment at `pos` from the prefab with ID `id`, clears its
    /// ID from every grid and closes the gap in the ID space.
    ///
    /// When the removed segment was the only one at the minimum of some axis,
    /// the remaining segment positions are compacted. With `keep_in_place`
    /// the placed cells stay where they are and the instance origin absorbs
    /// the shift; without it the remaining cells follow the compaction, which
    /// requires the target cells to be empty or vacated by the same instance.
    ///
    /// # Errors
    ///
    /// Returns `PrefabNotFound`, `SegmentNotFound`, `LastSegment`,
    /// `OutOfBounds` or `Obstructed`, or a cache error. The list is unchanged
    /// on error.
    pub fn remove_segment_from_prefab(
        &mut self,
        id: u16,
        pos: Byte3,
        keep_in_place: bool,
        mut cache: Option<&mut BlockInstancesCache>,
    ) -> PrefabResult<PrefabSegment> {
        let prefab = self.prefabs.get(&id).ok_or(PrefabError::PrefabNotFound(id))?;
        let index = prefab
            .segment_index(pos)
            .ok_or(PrefabError::SegmentNotFound { prefab_id: id, pos })?;
        if prefab.segment_count() == 1 {
            return Err(PrefabError::LastSegment(id));
        }

        let removed_id = id + index as u16;
        let base = prefab.main_pos();
        let shift = prefab.removal_shift(pos);
        let move_cells = !keep_in_place && shift != Int3::ZERO;
        let removed_item = (Int3::from(pos) - base, removed_id);

        let mut vacated = Vec::with_capacity(prefab.segment_count());
        let mut old_items = Vec::new();
        let mut new_items = Vec::new();
        for (k, segment) in prefab.ordered_segments().enumerate() {
            let offset = segment.pos_i() - base;
            vacated.push(offset);
            if k != index {
                let new_k = if k < index { k } else { k - 1 };
                old_items.push((offset, id + k as u16));
                new_items.push((offset - shift, id + new_k as u16));
            }
        }
        // old_items[0] belongs to the segment that is main afterwards.
        let next_main = old_items.first().map_or(Int3::ZERO, |&(offset, _)| offset);
        let translation = if move_cells { next_main - shift } else { next_main };

        let groups = self.instances_for(id, cache.as_deref())?;
        if move_cells {
            let targets: Vec<Int3> = new_items.iter().map(|&(offset, _)| offset).collect();
            self.check_instances(&groups, &targets, &vacated, true)?;
        }

        self.clear_instances(&groups, Rekey::NONE, &[removed_item])?;
        self.remove_id_from_prefabs(removed_id)?;
        if move_cells {
            self.clear_instances(&groups, Rekey::NONE, &old_items)?;
        }
        let (mut segment, _) = self
            .prefabs
            .get_mut(&id)
            .ok_or(PrefabError::PrefabNotFound(id))?
            .remove_segment(pos)?;
        segment.prefab_id = 0;
        self.renumber(removed_id + 1, id + 1, -1);
        self.reindex();

        let rekey = Rekey { from: id + 1, delta: -1 };
        if move_cells {
            self.write_instances(&groups, rekey, &new_items)?;
        }

        if let Some(cache) = cache.as_deref_mut() {
            if index == 0 {
                // every cell of the old second segment is an anchor now
                cache.rebuild(self);
            } else {
                cache.rekey(rekey);
                cache.translate(translation);
                cache.retain_present(self);
            }
            cache.stamp(self.version);
        }

        tracing::debug!(
            "Removed segment {} from prefab {} (shift {}, cells moved: {})",
            removed_id,
            id,
            shift,
            move_cells
        );
        Ok(segment)
    }

    /// Places prefab `placed_id` into the grid of prefab `target_id`, with
    /// its origin at `origin`.
    ///
    /// # Errors
    ///
    /// Returns `RecursivePlacement`, `PrefabNotFound`, `OutOfBounds`, or
    /// `Obstructed` when a target cell is taken and `overwrite_blocks` is
    /// not set. A cache only has to be current; it may track any prefab.
    pub fn place_prefab(
        &mut self,
        target_id: u16,
        origin: Int3,
        placed_id: u16,
        overwrite_blocks: bool,
        cache: Option<&mut BlockInstancesCache>,
    ) -> PrefabResult<()> {
        if target_id == placed_id {
            return Err(PrefabError::RecursivePlacement(target_id));
        }
        let placed = self.prefabs.get(&placed_id).ok_or(PrefabError::PrefabNotFound(placed_id))?;
        let target = self.prefabs.get(&target_id).ok_or(PrefabError::PrefabNotFound(target_id))?;

        let anchor = origin + placed.main_pos();
        let cells: Vec<(Int3, u16)> = placed
            .enumerate_with_id()
            .map(|(segment_id, s)| (origin + s.pos_i(), segment_id))
            .collect();
        for &(cell, _) in &cells {
            check_cell(cell)?;
            if !overwrite_blocks && target.blocks.get_block_or_default(cell) != 0 {
                return Err(PrefabError::Obstructed {
                    prefab_id: target_id,
                    prefab_name: target.name.clone(),
                    source_pos: anchor,
                    obstructed_pos: cell,
                });
            }
        }
        if let Some(cache) = cache.as_deref() {
            cache.check_version(self)?;
        }

        let grid = [InstanceGroup {
            prefab_id: target_id,
            positions: vec![Int3::ZERO],
        }];
        let writes = self.write_instances(&grid, Rekey::NONE, &cells)?;
        if let Some(cache) = cache {
            cache.apply_writes(&writes);
            cache.stamp(self.version);
        }

        tracing::trace!("Placed prefab {} in {} at {}", placed_id, target_id, origin);
        Ok(())
    }

    /// [`PrefabList::place_prefab`], reporting only success.
    pub fn try_place_prefab(
        &mut self,
        target_id: u16,
        origin: Int3,
        placed_id: u16,
        overwrite_blocks: bool,
        cache: Option<&mut BlockInstancesCache>,
    ) -> bool {
        self.place_prefab(target_id, origin, placed_id, overwrite_blocks, cache).is_ok()
    }

    /// Removes the placed block covering `pos` in the grid of prefab
    /// `target_id`: every cell of a custom prefab instance, or the single
    /// cell of a stock block. Returns the number of cleared cells.
    ///
    /// # Errors
    ///
    /// Returns `PrefabNotFound` for an unknown target, or `StaleCache`.
    pub fn remove_placed(
        &mut self,
        target_id: u16,
        pos: Int3,
        cache: Option<&mut BlockInstancesCache>,
    ) -> PrefabResult<usize> {
        let target = self.prefabs.get(&target_id).ok_or(PrefabError::PrefabNotFound(target_id))?;
        let value = target.blocks.get_block_or_default(pos);
        if value == 0 {
            return Ok(0);
        }
        if let Some(cache) = cache.as_deref() {
            cache.check_version(self)?;
        }

        let cells = match self.owner_of(value) {
            Some(owner) => {
                let ordinal = usize::from(value - owner.id());
                let segment_pos = owner
                    .ordered_segments()
                    .nth(ordinal)
                    .map_or(Int3::ZERO, PrefabSegment::pos_i);
                let origin = pos - segment_pos;
                owner
                    .enumerate_with_id()
                    .map(|(segment_id, s)| (origin + s.pos_i(), segment_id))
                    .collect()
            }
            None => vec![(pos, value)],
        };

        let grid = [InstanceGroup {
            prefab_id: target_id,
            positions: vec![Int3::ZERO],
        }];
        let writes = self.clear_instances(&grid, Rekey::NONE, &cells)?;
        if let Some(cache) = cache {
            cache.apply_writes(&writes);
            cache.stamp(self.version);
        }
        Ok(writes.len())
    }
}

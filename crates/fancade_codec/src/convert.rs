//! # Record Grouping
//!
//! Converts between the flat record stream and a `PrefabList`.
//!
//! Record `i` has ID `id_offset + i`. A run of consecutive records sharing a
//! group id other than [`NO_GROUP`] forms one prefab whose main segment is
//! the first record of the run; the group id must equal that record's ID.
//! Records without a group are single-segment prefabs at position zero.
//!
//! ## Normalization
//!
//! Decoding keeps every prefab, not every byte. Re-encoding a decoded list
//! writes its canonical form:
//!
//! - The group field is written only for prefabs with several segments or
//!   with the main segment away from zero, so a lone grouped record at zero
//!   loses it.
//! - Prefab-level fields on group members are dropped with a warning.
//! - Fields equal to their default are omitted, even when stored.
//! - Block grids are cut down to their occupied extent.
//!
//! Encoding the canonical form again gives the same records.

use fancade_core::{
    BlockData, Byte3, Int3, Prefab, PrefabCollider, PrefabError, PrefabList, PrefabSegment, PrefabType, SegmentMap,
    DEFAULT_BACKGROUND_COLOR, DEFAULT_PREFAB_NAME,
};

use crate::error::{CodecError, CodecResult};
use crate::raw::{RawGroup, RawPrefab, NO_GROUP};

/// Builds a list from records stored from `id_offset` upwards.
pub fn records_to_list(id_offset: u16, records: Vec<RawPrefab>) -> CodecResult<PrefabList> {
    let mut prefabs = Vec::new();
    let mut records = records.into_iter().enumerate().peekable();

    while let Some((index, mut main)) = records.next() {
        let id = record_id(id_offset, index)?;
        let group_id = main.group_id();
        if group_id != NO_GROUP && group_id != id {
            return Err(CodecError::InvalidGroup {
                record: index,
                group_id,
                expected: id,
            });
        }

        let mut prefab = prefab_from_main(&mut main);
        push_record(&mut prefab, main)?;

        if group_id != NO_GROUP {
            while let Some((member, raw)) = records.next_if(|(_, r)| r.group_id() == group_id) {
                if raw.has_metadata() {
                    tracing::warn!("Ignoring metadata on group member record {} of group {}", member, group_id);
                }
                push_record(&mut prefab, raw)?;
            }
        }
        prefabs.push(prefab);
    }

    let list = PrefabList::from_prefabs(id_offset, prefabs)?;
    tracing::debug!("Grouped {} records into {} prefabs", list.segment_count(), list.prefab_count());
    Ok(list)
}

/// Flattens a list into one record per segment.
#[must_use]
pub fn list_to_records(list: &PrefabList) -> Vec<RawPrefab> {
    let mut records = Vec::with_capacity(list.segment_count());
    for prefab in list.prefabs() {
        let grouped = prefab.segment_count() > 1 || prefab.main_pos() != Int3::ZERO;
        for (index, segment) in prefab.ordered_segments().enumerate() {
            let mut raw = if index == 0 { main_record(prefab) } else { RawPrefab::default() };
            if grouped {
                raw.group = Some(RawGroup {
                    id: prefab.id(),
                    pos: segment.pos_in_prefab(),
                });
            }
            raw.voxels.clone_from(&segment.voxels);
            records.push(raw);
        }
    }
    records
}

/// Shifts every custom reference (`>= from`) by `delta`.
///
/// Covers grid cells and group ids. IDs below `from` belong to the stock
/// catalog and are left alone.
pub fn shift_ids(records: &mut [RawPrefab], from: u16, delta: u16) -> CodecResult<()> {
    let shift = |id: u16| -> CodecResult<u16> {
        if id < from {
            return Ok(id);
        }
        id.checked_add(delta)
            .filter(|&shifted| shifted != NO_GROUP)
            .ok_or(CodecError::Prefab(PrefabError::IdSpaceExhausted {
                requested: usize::from(id) + usize::from(delta),
            }))
    };

    for raw in records.iter_mut() {
        if let Some(group) = raw.group.as_mut().filter(|g| g.id != NO_GROUP) {
            group.id = shift(group.id)?;
        }
        if let Some(blocks) = raw.blocks.as_mut() {
            for cell in blocks.as_mut_slice() {
                if *cell != 0 {
                    *cell = shift(*cell)?;
                }
            }
        }
    }
    Ok(())
}

fn record_id(id_offset: u16, index: usize) -> CodecResult<u16> {
    u16::try_from(usize::from(id_offset) + index)
        .ok()
        .filter(|&id| id != NO_GROUP)
        .ok_or(CodecError::TooManyItems(index + 1))
}

/// Moves the prefab-level fields out of a main record.
fn prefab_from_main(raw: &mut RawPrefab) -> Prefab {
    let mut prefab = Prefab::new(raw.name.take().unwrap_or_else(|| DEFAULT_PREFAB_NAME.to_owned()));
    prefab.prefab_type = raw.prefab_type.unwrap_or_default();
    prefab.collider = raw.collider.unwrap_or_default();
    prefab.background_color = raw.background_color.unwrap_or(DEFAULT_BACKGROUND_COLOR);
    prefab.editable = !raw.not_editable;
    prefab.settings = raw.settings.take().unwrap_or_default();
    prefab.connections = raw.connections.take().unwrap_or_default();
    if let Some(blocks) = raw.blocks.take() {
        prefab.blocks = BlockData::from_array(blocks);
    }
    prefab
}

fn push_record(prefab: &mut Prefab, raw: RawPrefab) -> CodecResult<()> {
    let pos = raw.group.map_or(Byte3::ZERO, |g| g.pos);
    prefab.push_segment(PrefabSegment::new(pos, raw.voxels)?)?;
    Ok(())
}

fn main_record(prefab: &Prefab) -> RawPrefab {
    let blocks = prefab.blocks.to_trimmed_array();
    RawPrefab {
        prefab_type: Some(prefab.prefab_type).filter(|&t| t != PrefabType::Normal),
        name: Some(prefab.name.clone()).filter(|n| n != DEFAULT_PREFAB_NAME),
        background_color: Some(prefab.background_color).filter(|&c| c != DEFAULT_BACKGROUND_COLOR),
        not_editable: !prefab.editable,
        collider: Some(prefab.collider).filter(|&c| c != PrefabCollider::default()),
        group: None,
        voxels: None,
        blocks: (!blocks.is_empty()).then_some(blocks),
        settings: (!prefab.settings.is_empty()).then(|| prefab.settings.clone()),
        connections: (!prefab.connections.is_empty()).then(|| prefab.connections.clone()),
    }
}

//! Checked mutable access to a prefab inside a list.

use std::ops::Deref;

use crate::grid::BlockData;
use crate::math::Byte3;
use crate::prefab::{Connection, Prefab, PrefabCollider, PrefabSetting, PrefabType, SegmentMap};
use crate::segment::PrefabSegment;

/// Editor for a prefab owned by a `PrefabList`.
///
/// Metadata, settings, wires, the block grid and segment meshes are open.
/// The ID and the segment layout are not: those only change through the
/// list, which keeps the ID space consistent.
#[derive(Debug)]
pub struct PrefabMut<'a> {
    prefab: &'a mut Prefab,
}

impl<'a> PrefabMut<'a> {
    pub(super) fn new(prefab: &'a mut Prefab) -> Self {
        Self { prefab }
    }

    /// Display name.
    pub fn name_mut(&mut self) -> &mut String {
        &mut self.prefab.name
    }

    /// Collision shape.
    pub fn collider_mut(&mut self) -> &mut PrefabCollider {
        &mut self.prefab.collider
    }

    /// Object kind.
    pub fn prefab_type_mut(&mut self) -> &mut PrefabType {
        &mut self.prefab.prefab_type
    }

    /// Background color index.
    pub fn background_color_mut(&mut self) -> &mut u8 {
        &mut self.prefab.background_color
    }

    /// Editable flag.
    pub fn editable_mut(&mut self) -> &mut bool {
        &mut self.prefab.editable
    }

    /// Block settings.
    pub fn settings_mut(&mut self) -> &mut Vec<PrefabSetting> {
        &mut self.prefab.settings
    }

    /// Wires.
    pub fn connections_mut(&mut self) -> &mut Vec<Connection> {
        &mut self.prefab.connections
    }

    /// Raw block grid.
    ///
    /// Writes here bypass placement checks; use `PrefabList::place_prefab`
    /// to place whole custom prefabs.
    pub fn blocks_mut(&mut self) -> &mut BlockData {
        &mut self.prefab.blocks
    }

    /// Segment at `pos`, for mesh edits.
    pub fn segment_mut(&mut self, pos: Byte3) -> Option<&mut PrefabSegment> {
        self.prefab.segment_mut(pos)
    }
}

impl Deref for PrefabMut<'_> {
    type Target = Prefab;

    fn deref(&self) -> &Prefab {
        self.prefab
    }
}

#[cfg(test)]
mod tests {
    use crate::list::PrefabList;
    use crate::math::{Byte3, Int3};
    use crate::prefab::{Prefab, PrefabCollider};
    use crate::voxel::Voxels;

    #[test]
    fn test_edits_bump_version() {
        let mut list = PrefabList::new(600);
        list.add_prefab(Prefab::single("Ball", None)).unwrap();
        let before = list.version();

        {
            let mut ball = list.prefab_mut(600).unwrap();
            *ball.collider_mut() = PrefabCollider::Sphere;
            ball.name_mut().push('!');
            ball.segment_mut(Byte3::ZERO).unwrap().voxels = Some(Voxels::new());
            ball.blocks_mut().set_block(Int3::ZERO, 5).unwrap();
            assert_eq!(ball.id(), 600);
        }

        assert!(list.version() > before);
        let ball = list.prefab(600).unwrap();
        assert_eq!(ball.name, "Ball!");
        assert_eq!(ball.collider, PrefabCollider::Sphere);
        assert!(ball.main_segment().unwrap().voxels.is_some());
        assert!(list.prefab_mut(601).is_none());
    }
}

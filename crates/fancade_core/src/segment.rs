//! # Prefab Segments
//!
//! A segment is one 8x8x8 piece of a prefab. Its position inside the prefab
//! and the ID of the prefab that owns it are list-owned state: they are only
//! written by `Prefab` and `PrefabList` while (re)numbering.

use crate::error::{PrefabError, PrefabResult};
use crate::math::{Byte3, Int3};
use crate::voxel::Voxels;

/// Maximum number of segments along each axis of a prefab.
pub const MAX_PREFAB_EXTENT: u8 = 4;

/// Maximum number of segments in one prefab.
pub const MAX_SEGMENTS: usize = 64;

/// One segment of a prefab.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefabSegment {
    /// Owning prefab ID (back-reference, written by the list).
    pub(crate) prefab_id: u16,
    /// Position inside the prefab.
    pub(crate) pos: Byte3,
    /// Optional voxel mesh.
    pub voxels: Option<Voxels>,
}

impl PrefabSegment {
    /// Creates a segment at `pos`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSegmentPosition` if any component is >= `MAX_PREFAB_EXTENT`.
    pub fn new(pos: Byte3, voxels: Option<Voxels>) -> PrefabResult<Self> {
        validate_position(pos)?;
        Ok(Self {
            prefab_id: 0,
            pos,
            voxels,
        })
    }

    /// ID of the prefab this segment belongs to (0 while unowned).
    #[inline]
    #[must_use]
    pub const fn prefab_id(&self) -> u16 {
        self.prefab_id
    }

    /// Position inside the owning prefab.
    #[inline]
    #[must_use]
    pub const fn pos_in_prefab(&self) -> Byte3 {
        self.pos
    }

    /// Position inside the owning prefab as a signed vector.
    #[inline]
    #[must_use]
    pub fn pos_i(&self) -> Int3 {
        Int3::from(self.pos)
    }

    /// Returns true if the segment has no mesh or every voxel is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.as_ref().map_or(true, Voxels::is_empty)
    }
}

/// Checks that `pos` lies inside the 4x4x4 prefab extent.
pub fn validate_position(pos: Byte3) -> PrefabResult<()> {
    if pos.x >= MAX_PREFAB_EXTENT || pos.y >= MAX_PREFAB_EXTENT || pos.z >= MAX_PREFAB_EXTENT {
        Err(PrefabError::InvalidSegmentPosition(pos))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::Voxel;

    #[test]
    fn test_position_bounds() {
        assert!(PrefabSegment::new(Byte3::new(3, 3, 3), None).is_ok());
        assert_eq!(
            PrefabSegment::new(Byte3::new(4, 0, 0), None),
            Err(PrefabError::InvalidSegmentPosition(Byte3::new(4, 0, 0)))
        );
    }

    #[test]
    fn test_emptiness() {
        let mut segment = PrefabSegment::new(Byte3::ZERO, None).unwrap();
        assert!(segment.is_empty());

        segment.voxels = Some(Voxels::new());
        assert!(segment.is_empty());

        let mut voxels = Voxels::new();
        voxels.set(0, 0, 0, Voxel::solid(3));
        segment.voxels = Some(voxels);
        assert!(!segment.is_empty());
    }
}

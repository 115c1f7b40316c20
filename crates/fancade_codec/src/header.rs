//! Bit-packed record header.

use crate::error::{CodecError, CodecResult};

bitflags::bitflags! {
    /// Presence bits of a prefab record.
    ///
    /// Fields are stored in descending bit order; absent fields are skipped.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PrefabHeader: u16 {
        /// Prefab type byte follows.
        const HAS_TYPE = 1 << 12;
        /// Name differs from the default.
        const HAS_NAME = 1 << 11;
        /// Background color differs from the default.
        const HAS_BACKGROUND = 1 << 8;
        /// Player may not edit this prefab.
        const NOT_EDITABLE = 1 << 6;
        /// Collider differs from the default.
        const HAS_COLLIDER = 1 << 5;
        /// Record belongs to a multi-segment group.
        const IN_GROUP = 1 << 4;
        /// Voxel mesh follows.
        const HAS_VOXELS = 1 << 3;
        /// Block grid follows.
        const HAS_BLOCKS = 1 << 2;
        /// Settings list follows.
        const HAS_SETTINGS = 1 << 1;
        /// Connection list follows.
        const HAS_CONNECTIONS = 1;
    }
}

impl PrefabHeader {
    /// Parses a stored header, rejecting unknown bits.
    pub fn parse(bits: u16) -> CodecResult<Self> {
        Self::from_bits(bits).ok_or(CodecError::UnknownHeaderBits(bits & !Self::all().bits()))
    }
}

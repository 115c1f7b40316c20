//! # Prefab Error Types
//!
//! All errors that can occur while editing a prefab list.

use thiserror::Error;

use crate::math::{Byte3, Int3};

/// Errors that can occur in the prefab data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefabError {
    /// A placement would land on a cell that is already occupied.
    #[error(
        "placement obstructed in prefab {prefab_id} ('{prefab_name}'): instance at {source_pos} collides at {obstructed_pos}"
    )]
    Obstructed {
        /// ID of the prefab whose grid contains the collision.
        prefab_id: u16,
        /// Name of that prefab.
        prefab_name: String,
        /// Grid cell of the instance being extended or moved.
        source_pos: Int3,
        /// Grid cell that is already occupied.
        obstructed_pos: Int3,
    },

    /// A grid position is negative or otherwise outside the addressable range.
    #[error("grid position {pos} is out of bounds")]
    OutOfBounds {
        /// The offending position.
        pos: Int3,
    },

    /// No prefab with this ID exists in the list.
    #[error("prefab not found: {0}")]
    PrefabNotFound(u16),

    /// The prefab has no segment at this position.
    #[error("prefab {prefab_id} has no segment at {pos}")]
    SegmentNotFound {
        /// Prefab ID.
        prefab_id: u16,
        /// Segment position.
        pos: Byte3,
    },

    /// The prefab already has a segment at this position.
    #[error("prefab {prefab_id} already has a segment at {pos}")]
    SegmentOccupied {
        /// Prefab ID.
        prefab_id: u16,
        /// Segment position.
        pos: Byte3,
    },

    /// Segment position outside the 4x4x4 prefab extent.
    #[error("segment position {0} is outside the prefab extent")]
    InvalidSegmentPosition(Byte3),

    /// The prefab already holds the maximum number of segments.
    #[error("prefab {prefab_id} already has the maximum number of segments")]
    TooManySegments {
        /// Prefab ID.
        prefab_id: u16,
    },

    /// A prefab without segments cannot be added to a list.
    #[error("prefab has no segments")]
    EmptyPrefab,

    /// The last segment of a prefab cannot be removed; remove the prefab instead.
    #[error("cannot remove the last segment of prefab {0}")]
    LastSegment(u16),

    /// `insert_prefab` was given an ID that is not a prefab boundary.
    #[error("cannot insert prefab at id {id}: valid ids are existing prefab ids or {next_id}")]
    InvalidInsertId {
        /// Requested ID.
        id: u16,
        /// The next free ID of the list.
        next_id: u16,
    },

    /// The 16-bit ID space cannot hold the requested number of segments.
    #[error("id space exhausted: {requested} segments requested")]
    IdSpaceExhausted {
        /// Total segments that would be needed.
        requested: usize,
    },

    /// A prefab cannot be placed inside its own grid.
    #[error("prefab {0} cannot be placed inside itself")]
    RecursivePlacement(u16),

    /// A voxel buffer has the wrong length.
    #[error("invalid voxel buffer length: expected {expected}, got {actual}")]
    InvalidVoxelLength {
        /// Required length.
        expected: usize,
        /// Provided length.
        actual: usize,
    },

    /// A grid size is negative or too large.
    #[error("invalid grid size {0}")]
    InvalidSize(Int3),

    /// A cache was used after the list changed without it.
    #[error("instance cache is stale (built at version {cache_version}, list is at {list_version})")]
    StaleCache {
        /// Version stamped into the cache.
        cache_version: u64,
        /// Current list version.
        list_version: u64,
    },

    /// A cache tracking a different ID was passed to an operation.
    #[error("instance cache tracks id {actual}, operation needs {expected}")]
    CacheMismatch {
        /// ID the operation works on.
        expected: u16,
        /// ID the cache tracks.
        actual: u16,
    },
}

/// Result type for prefab operations.
pub type PrefabResult<T> = Result<T, PrefabError>;

//! # Fancade Core
//!
//! In-memory model of a Fancade game's custom blocks.
//!
//! ## Design Principles
//!
//! 1. **Consistent IDs**: segment IDs are always consecutive from the list's
//!    ID offset, and every grid reference points at a live segment
//! 2. **All-or-nothing edits**: a rejected edit leaves the list untouched
//! 3. **Explicit caching**: instance caches are stamped with the list
//!    generation and refuse to run stale
//!
//! ## Core Components
//!
//! - `BlockData`: auto-growing grid of block references
//! - `Voxels`: 8x8x8 mesh of one segment
//! - `Prefab` / `PrefabSegment`: a placeable block and its pieces
//! - `PrefabList`: ID space, renumbering, placement and reference rewriting
//! - `BlockInstancesCache`: reverse index of where a prefab is placed
//!
//! ## Example
//!
//! ```rust,ignore
//! use fancade_core::{Int3, Prefab, PrefabList};
//!
//! let mut list = PrefabList::default();
//! let cube = list.add_prefab(Prefab::single("Cube", None))?;
//! let level = list.add_prefab(Prefab::single("Level", None))?;
//! list.place_prefab(level, Int3::new(2, 0, 2), cube, false, None)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod error;
pub mod grid;
pub mod list;
pub mod math;
pub mod prefab;
pub mod segment;
pub mod voxel;

pub use cache::{BlockInstancesCache, InstanceGroup};
pub use error::{PrefabError, PrefabResult};
pub use grid::{calc_size, Array3D, BlockData, BLOCK_SIZE, MAX_GRID_COORD};
pub use list::{PrefabList, PrefabMut, DEFAULT_ID_OFFSET, MAX_SEGMENT_ID};
pub use math::{Byte3, Float3, Int3, Ushort3};
pub use prefab::{
    order_key, Connection, Prefab, PrefabCollider, PrefabSetting, PrefabType, SegmentMap, SettingValue,
    DEFAULT_BACKGROUND_COLOR, DEFAULT_PREFAB_NAME,
};
pub use segment::{validate_position, PrefabSegment, MAX_PREFAB_EXTENT, MAX_SEGMENTS};
pub use voxel::{Voxel, Voxels, FACE_COUNT, VOXEL_BYTES, VOXEL_COUNT, VOXELS_PER_AXIS};

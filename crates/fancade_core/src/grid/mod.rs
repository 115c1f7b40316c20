//! # Grid Primitive
//!
//! Dense 3D arrays and the auto-sizing block reference grid built on them.

pub mod array3d;
pub mod block_data;

pub use array3d::Array3D;
pub use block_data::{calc_size, BlockData, BLOCK_SIZE, MAX_GRID_COORD};

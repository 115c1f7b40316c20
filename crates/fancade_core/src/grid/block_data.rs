//! # Block Reference Grid
//!
//! `BlockData` is the grid of `u16` block references stored in a prefab.
//!
//! ## Growth Model
//!
//! The backing array grows in whole blocks of `BLOCK_SIZE`³ cells when a
//! nonzero value is written past its capacity. A separate tight extent
//! (`size`) tracks the occupied bounding box. Clearing a cell only triggers
//! a rescan when the cell lay on the max boundary of that box, so most
//! removals stay O(1).

use parking_lot::Mutex;
use rayon::prelude::*;

use super::array3d::Array3D;
use crate::error::{PrefabError, PrefabResult};
use crate::math::Int3;

/// Growth granularity of the backing array along each axis.
pub const BLOCK_SIZE: i32 = 8;

/// Largest coordinate a grid can address (sizes are stored as `u16`).
pub const MAX_GRID_COORD: i32 = u16::MAX as i32 - 1;

/// Grids smaller than this are scanned on the calling thread.
const PARALLEL_SCAN_THRESHOLD: usize = 64 * 64 * 64;

/// Auto-sizing grid of block references.
///
/// A cell value of `0` is empty; any other value is an ID into the owning
/// prefab list.
#[derive(Clone, Debug, Default)]
pub struct BlockData {
    /// Backing storage, a whole number of blocks along each axis.
    array: Array3D<u16>,
    /// Occupied bounding box (exclusive max corner).
    size: Int3,
}

impl BlockData {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing array, computing its occupied extent.
    #[must_use]
    pub fn from_array(array: Array3D<u16>) -> Self {
        let size = calc_size(&array);
        Self { array, size }
    }

    /// Occupied extent (max occupied coordinate + 1 on each axis).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Int3 {
        self.size
    }

    /// Extent of the backing array.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> Int3 {
        self.array.size()
    }

    /// Returns true if no cell is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size.x == 0 || self.size.y == 0 || self.size.z == 0
    }

    /// Returns true if `pos` lies inside the backing array.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, pos: Int3) -> bool {
        self.array.in_bounds(pos)
    }

    /// Gets the block at `pos`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `pos` is outside the backing array.
    pub fn get_block(&self, pos: Int3) -> PrefabResult<u16> {
        self.array.get(pos).ok_or(PrefabError::OutOfBounds { pos })
    }

    /// Gets the block at `pos`, or `0` when out of bounds.
    #[inline]
    #[must_use]
    pub fn get_block_or_default(&self, pos: Int3) -> u16 {
        self.array.get(pos).unwrap_or(0)
    }

    /// Gets the block at `pos`; the caller guarantees it is in bounds.
    #[inline]
    #[must_use]
    pub fn get_block_unchecked(&self, pos: Int3) -> u16 {
        self.array.get_unchecked(pos)
    }

    /// Sets the block at `pos`, growing or shrinking the grid as needed.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `pos` is negative or beyond `MAX_GRID_COORD`.
    pub fn set_block(&mut self, pos: Int3, id: u16) -> PrefabResult<()> {
        if pos.any_negative() || pos.x > MAX_GRID_COORD || pos.y > MAX_GRID_COORD || pos.z > MAX_GRID_COORD {
            return Err(PrefabError::OutOfBounds { pos });
        }

        if id != 0 {
            self.ensure_size(pos)?;
            self.array.set_unchecked(pos, id);
        } else if self.array.in_bounds(pos) {
            let previous = self.array.get_unchecked(pos);
            self.array.set_unchecked(pos, 0);
            if previous != 0 && self.on_max_boundary(pos) {
                self.trim()?;
            }
        }
        Ok(())
    }

    /// Sets the block at `pos` without size bookkeeping.
    ///
    /// The caller guarantees `pos` is inside the occupied extent and that the
    /// write does not change it (e.g. replacing one nonzero ID with another).
    #[inline]
    pub fn set_block_unchecked(&mut self, pos: Int3, id: u16) {
        self.array.set_unchecked(pos, id);
    }

    /// Grows the grid so that `pos` is inside the occupied extent.
    pub fn ensure_size(&mut self, pos: Int3) -> PrefabResult<()> {
        if pos.in_bounds(self.size) {
            return Ok(());
        }
        self.size = self.size.max(pos + Int3::ONE);
        if !self.array.in_bounds(pos) {
            let capacity = self.size.ceil_to_multiple(BLOCK_SIZE).max(self.array.size());
            self.array.resize(capacity)?;
        }
        Ok(())
    }

    /// Recomputes the occupied extent and releases unused blocks.
    pub fn trim(&mut self) -> PrefabResult<()> {
        self.size = calc_size(&self.array);
        let capacity = self.size.ceil_to_multiple(BLOCK_SIZE);
        if capacity != self.array.size() {
            self.array.resize(capacity)?;
        }
        Ok(())
    }

    /// Removes every block.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Iterates over occupied cells in index order.
    pub fn iter_occupied(&self) -> impl Iterator<Item = (Int3, u16)> + '_ {
        let size = self.size;
        (0..size.z).flat_map(move |z| {
            (0..size.y).flat_map(move |y| {
                (0..size.x).filter_map(move |x| {
                    let pos = Int3::new(x, y, z);
                    let id = self.array.get_unchecked(pos);
                    (id != 0).then_some((pos, id))
                })
            })
        })
    }

    /// Positions of every cell equal to `id`, in index order.
    #[must_use]
    pub fn positions_of(&self, id: u16) -> Vec<Int3> {
        if id == 0 || self.is_empty() {
            return Vec::new();
        }
        self.array
            .as_slice()
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == id)
            .map(|(index, _)| self.array.position(index))
            .collect()
    }

    /// Returns true if any cell equals `id`.
    #[must_use]
    pub fn contains(&self, id: u16) -> bool {
        id != 0 && self.array.as_slice().contains(&id)
    }

    /// Applies `f` to every occupied cell. `f` must map nonzero to nonzero.
    pub fn map_occupied(&mut self, mut f: impl FnMut(u16) -> u16) {
        for cell in self.array.as_mut_slice() {
            if *cell != 0 {
                let mapped = f(*cell);
                debug_assert_ne!(mapped, 0, "occupied cell mapped to empty");
                *cell = mapped;
            }
        }
    }

    /// Replaces every cell matching `pred` with `0` and re-trims.
    ///
    /// Returns the number of cleared cells.
    pub fn clear_matching(&mut self, pred: impl Fn(u16) -> bool) -> PrefabResult<usize> {
        let mut cleared = 0;
        for cell in self.array.as_mut_slice() {
            if *cell != 0 && pred(*cell) {
                *cell = 0;
                cleared += 1;
            }
        }
        if cleared > 0 {
            self.trim()?;
        }
        Ok(cleared)
    }

    /// Copies the occupied extent into a tightly sized array.
    #[must_use]
    pub fn to_trimmed_array(&self) -> Array3D<u16> {
        if self.array.size() == self.size {
            return self.array.clone();
        }
        let mut out = Array3D::new(self.size).unwrap_or_default();
        let row = self.size.x as usize;
        if row > 0 {
            for z in 0..self.size.z {
                for y in 0..self.size.y {
                    let src = self.array.index(Int3::new(0, y, z));
                    let dst = out.index(Int3::new(0, y, z));
                    out.as_mut_slice()[dst..dst + row].copy_from_slice(&self.array.as_slice()[src..src + row]);
                }
            }
        }
        out
    }

    fn on_max_boundary(&self, pos: Int3) -> bool {
        pos.x == self.size.x - 1 || pos.y == self.size.y - 1 || pos.z == self.size.z - 1
    }
}

impl PartialEq for BlockData {
    /// Two grids are equal when their occupied content is equal, regardless
    /// of spare capacity.
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.iter_occupied().eq(other.iter_occupied())
    }
}

impl Eq for BlockData {}

impl From<Array3D<u16>> for BlockData {
    fn from(array: Array3D<u16>) -> Self {
        Self::from_array(array)
    }
}

/// Computes the occupied extent of `array`.
///
/// Large arrays are scanned one z-layer per rayon task; a layer only takes
/// the lock when it found something.
#[must_use]
pub fn calc_size(array: &Array3D<u16>) -> Int3 {
    let size = array.size();
    if array.is_empty() {
        return Int3::ZERO;
    }
    let width = size.x as usize;
    let layer = width * size.y as usize;

    let scan_layer = |z: usize, cells: &[u16]| -> Int3 {
        let mut local = Int3::ZERO;
        for (i, &cell) in cells.iter().enumerate() {
            if cell != 0 {
                let found = Int3::new((i % width) as i32 + 1, (i / width) as i32 + 1, z as i32 + 1);
                local = local.max(found);
            }
        }
        local
    };

    if array.len() < PARALLEL_SCAN_THRESHOLD {
        return array
            .as_slice()
            .chunks(layer)
            .enumerate()
            .map(|(z, cells)| scan_layer(z, cells))
            .fold(Int3::ZERO, Int3::max);
    }

    let bound = Mutex::new(Int3::ZERO);
    array
        .as_slice()
        .par_chunks(layer)
        .enumerate()
        .for_each(|(z, cells)| {
            let local = scan_layer(z, cells);
            if local != Int3::ZERO {
                let mut bound = bound.lock();
                *bound = bound.max(local);
            }
        });
    bound.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_in_blocks() {
        let mut blocks = BlockData::new();
        blocks.set_block(Int3::new(2, 0, 9), 5).unwrap();

        assert_eq!(blocks.size(), Int3::new(3, 1, 10));
        assert_eq!(blocks.capacity(), Int3::new(8, 8, 16));
        assert_eq!(blocks.get_block(Int3::new(2, 0, 9)), Ok(5));
    }

    #[test]
    fn test_shrinks_on_boundary_removal() {
        let mut blocks = BlockData::new();
        blocks.set_block(Int3::new(1, 1, 1), 4).unwrap();
        blocks.set_block(Int3::new(10, 0, 0), 4).unwrap();
        assert_eq!(blocks.size(), Int3::new(11, 2, 2));

        blocks.set_block(Int3::new(10, 0, 0), 0).unwrap();
        assert_eq!(blocks.size(), Int3::new(2, 2, 2));
        assert_eq!(blocks.capacity(), Int3::new(8, 8, 8));

        blocks.set_block(Int3::new(1, 1, 1), 0).unwrap();
        assert!(blocks.is_empty());
        assert_eq!(blocks.capacity(), Int3::ZERO);
    }

    #[test]
    fn test_interior_removal_keeps_size() {
        let mut blocks = BlockData::new();
        blocks.set_block(Int3::new(0, 0, 0), 1).unwrap();
        blocks.set_block(Int3::new(3, 3, 3), 1).unwrap();
        blocks.set_block(Int3::new(0, 0, 0), 0).unwrap();
        assert_eq!(blocks.size(), Int3::new(4, 4, 4));
    }

    #[test]
    fn test_checked_and_default_reads() {
        let blocks = BlockData::new();
        assert!(blocks.get_block(Int3::new(0, 0, 0)).is_err());
        assert_eq!(blocks.get_block_or_default(Int3::new(0, 0, 0)), 0);
    }

    #[test]
    fn test_negative_position_rejected() {
        let mut blocks = BlockData::new();
        assert_eq!(
            blocks.set_block(Int3::new(-1, 0, 0), 3),
            Err(PrefabError::OutOfBounds { pos: Int3::new(-1, 0, 0) })
        );
    }

    #[test]
    fn test_equality_ignores_capacity() {
        let mut a = BlockData::new();
        a.set_block(Int3::new(20, 0, 0), 1).unwrap();
        a.set_block(Int3::new(1, 0, 0), 2).unwrap();
        a.set_block(Int3::new(20, 0, 0), 0).unwrap();

        let mut b = BlockData::new();
        b.set_block(Int3::new(1, 0, 0), 2).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_scan_matches_serial() {
        let mut array: Array3D<u16> = Array3D::new(Int3::new(70, 70, 70)).unwrap();
        array.set(Int3::new(69, 3, 10), 9);
        array.set(Int3::new(0, 50, 64), 9);
        assert_eq!(calc_size(&array), Int3::new(70, 51, 65));
    }

    #[test]
    fn test_trimmed_array() {
        let mut blocks = BlockData::new();
        blocks.set_block(Int3::new(1, 2, 0), 7).unwrap();
        let trimmed = blocks.to_trimmed_array();
        assert_eq!(trimmed.size(), Int3::new(2, 3, 1));
        assert_eq!(trimmed.get(Int3::new(1, 2, 0)), Some(7));
    }
}

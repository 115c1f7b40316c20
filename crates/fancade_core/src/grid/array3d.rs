//! # Dense 3D Array
//!
//! Flat buffer addressed as `x + y * W + z * W * H`.

use crate::error::{PrefabError, PrefabResult};
use crate::math::Int3;

/// A dense 3D array stored in x-fastest order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Array3D<T> {
    /// Extent along each axis.
    size: Int3,
    /// Cells, `size.x * size.y * size.z` of them.
    data: Vec<T>,
}

impl<T: Copy + Default> Array3D<T> {
    /// Creates an array filled with `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if any component is negative.
    pub fn new(size: Int3) -> PrefabResult<Self> {
        if size.any_negative() {
            return Err(PrefabError::InvalidSize(size));
        }
        let len = usize::try_from(size.volume()).map_err(|_| PrefabError::InvalidSize(size))?;
        Ok(Self {
            size,
            data: vec![T::default(); len],
        })
    }

    /// Wraps an existing buffer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if the buffer length does not match `size`.
    pub fn from_vec(size: Int3, data: Vec<T>) -> PrefabResult<Self> {
        if size.any_negative() || size.volume() != data.len() as i64 {
            return Err(PrefabError::InvalidSize(size));
        }
        Ok(Self { size, data })
    }

    /// Extent along each axis.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Int3 {
        self.size
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the array holds no cells.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if `pos` addresses a cell of this array.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, pos: Int3) -> bool {
        pos.in_bounds(self.size)
    }

    /// Linear index of `pos`. The position is not checked.
    #[inline]
    #[must_use]
    pub const fn index(&self, pos: Int3) -> usize {
        (pos.x + pos.y * self.size.x + pos.z * self.size.x * self.size.y) as usize
    }

    /// Position of a linear index.
    #[inline]
    #[must_use]
    pub const fn position(&self, index: usize) -> Int3 {
        let index = index as i32;
        let layer = self.size.x * self.size.y;
        Int3::new(index % self.size.x, index / self.size.x % self.size.y, index / layer)
    }

    /// Gets the cell at `pos`, or `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: Int3) -> Option<T> {
        if self.in_bounds(pos) {
            Some(self.data[self.index(pos)])
        } else {
            None
        }
    }

    /// Gets the cell at `pos` without the extent check.
    ///
    /// Positions outside the extent alias other cells or panic on the
    /// slice bound; callers guarantee `pos` is in bounds.
    #[inline]
    #[must_use]
    pub fn get_unchecked(&self, pos: Int3) -> T {
        debug_assert!(self.in_bounds(pos), "position {pos} outside {}", self.size);
        self.data[self.index(pos)]
    }

    /// Sets the cell at `pos`. Returns false if out of bounds.
    #[inline]
    pub fn set(&mut self, pos: Int3, value: T) -> bool {
        if self.in_bounds(pos) {
            let index = self.index(pos);
            self.data[index] = value;
            true
        } else {
            false
        }
    }

    /// Sets the cell at `pos` without the extent check.
    #[inline]
    pub fn set_unchecked(&mut self, pos: Int3, value: T) {
        debug_assert!(self.in_bounds(pos), "position {pos} outside {}", self.size);
        let index = self.index(pos);
        self.data[index] = value;
    }

    /// Resizes the array, keeping the overlapping region.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if any component is negative.
    pub fn resize(&mut self, new_size: Int3) -> PrefabResult<()> {
        if new_size == self.size {
            return Ok(());
        }
        let mut resized = Self::new(new_size)?;
        let overlap = self.size.min(new_size);
        let row = overlap.x as usize;
        if row > 0 {
            for z in 0..overlap.z {
                for y in 0..overlap.y {
                    let src = self.index(Int3::new(0, y, z));
                    let dst = resized.index(Int3::new(0, y, z));
                    resized.data[dst..dst + row].copy_from_slice(&self.data[src..src + row]);
                }
            }
        }
        *self = resized;
        Ok(())
    }

    /// Cells in index order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable cells in index order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the array, returning its buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

//! # Vector Types
//!
//! Small fixed-size vectors used for grid and segment coordinates.
//!
//! - `Int3`: signed grid coordinate / offset (arithmetic happens here)
//! - `Byte3`: segment position inside a prefab
//! - `Ushort3`: on-disk grid position (settings, connections)
//! - `Float3`: on-disk float triple (vector settings)

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};

/// Signed 3D integer vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Int3 {
    /// X component.
    pub x: i32,
    /// Y component.
    pub y: i32,
    /// Z component.
    pub z: i32,
}

impl Int3 {
    /// All components zero.
    pub const ZERO: Self = Self::new(0, 0, 0);
    /// All components one.
    pub const ONE: Self = Self::new(1, 1, 1);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector with every component set to `v`.
    #[inline]
    #[must_use]
    pub const fn splat(v: i32) -> Self {
        Self::new(v, v, v)
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Returns true if any component is negative.
    #[inline]
    #[must_use]
    pub const fn any_negative(self) -> bool {
        self.x < 0 || self.y < 0 || self.z < 0
    }

    /// Returns true if every component is in `0..bound` of the matching axis.
    #[inline]
    #[must_use]
    pub const fn in_bounds(self, bound: Self) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.z >= 0
            && self.x < bound.x
            && self.y < bound.y
            && self.z < bound.z
    }

    /// Product of the components.
    #[inline]
    #[must_use]
    pub const fn volume(self) -> i64 {
        self.x as i64 * self.y as i64 * self.z as i64
    }

    /// Rounds every component up to the next multiple of `step`.
    #[inline]
    #[must_use]
    pub const fn ceil_to_multiple(self, step: i32) -> Self {
        Self::new(
            (self.x + step - 1) / step * step,
            (self.y + step - 1) / step * step,
            (self.z + step - 1) / step * step,
        )
    }
}

impl Add for Int3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Int3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Int3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Int3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Int3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Int3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<Byte3> for Int3 {
    #[inline]
    fn from(v: Byte3) -> Self {
        Self::new(i32::from(v.x), i32::from(v.y), i32::from(v.z))
    }
}

impl From<Ushort3> for Int3 {
    #[inline]
    fn from(v: Ushort3) -> Self {
        Self::new(i32::from(v.x), i32::from(v.y), i32::from(v.z))
    }
}

/// Unsigned 3D byte vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Byte3 {
    /// X component.
    pub x: u8,
    /// Y component.
    pub y: u8,
    /// Z component.
    pub z: u8,
}

impl Byte3 {
    /// All components zero.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Converts from `Int3`, failing if any component does not fit in a `u8`.
    #[must_use]
    pub fn try_from_int3(v: Int3) -> Option<Self> {
        Some(Self::new(
            u8::try_from(v.x).ok()?,
            u8::try_from(v.y).ok()?,
            u8::try_from(v.z).ok()?,
        ))
    }
}

impl fmt::Display for Byte3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Unsigned 3D 16-bit vector, laid out as on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Ushort3 {
    /// X component.
    pub x: u16,
    /// Y component.
    pub y: u16,
    /// Z component.
    pub z: u16,
}

impl Ushort3 {
    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z }
    }

    /// Converts from `Int3`, failing if any component does not fit in a `u16`.
    #[must_use]
    pub fn try_from_int3(v: Int3) -> Option<Self> {
        Some(Self::new(
            u16::try_from(v.x).ok()?,
            u16::try_from(v.y).ok()?,
            u16::try_from(v.z).ok()?,
        ))
    }
}

/// 3D float vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Float3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Float3 {
    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_to_multiple() {
        assert_eq!(Int3::new(1, 8, 9).ceil_to_multiple(8), Int3::new(8, 8, 16));
        assert_eq!(Int3::ZERO.ceil_to_multiple(8), Int3::ZERO);
    }

    #[test]
    fn test_narrowing_conversions() {
        assert_eq!(Byte3::try_from_int3(Int3::new(1, 2, 3)), Some(Byte3::new(1, 2, 3)));
        assert_eq!(Byte3::try_from_int3(Int3::new(-1, 0, 0)), None);
        assert_eq!(Ushort3::try_from_int3(Int3::new(70_000, 0, 0)), None);
    }

    #[test]
    fn test_in_bounds() {
        let bound = Int3::new(2, 2, 2);
        assert!(Int3::new(1, 1, 1).in_bounds(bound));
        assert!(!Int3::new(2, 0, 0).in_bounds(bound));
        assert!(!Int3::new(0, -1, 0).in_bounds(bound));
    }
}

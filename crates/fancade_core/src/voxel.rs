//! # Voxel Meshes
//!
//! Each prefab segment carries an optional 8x8x8 voxel mesh.
//!
//! ## Layout
//!
//! The mesh is stored face-major, exactly as on disk:
//! `index = x + 8y + 64z + 512 * face`. Every face byte packs a 7-bit color
//! index and a 1-bit glue flag (the high bit).

use crate::error::{PrefabError, PrefabResult};

/// Voxels along each axis of a segment.
pub const VOXELS_PER_AXIS: usize = 8;

/// Voxels per segment.
pub const VOXEL_COUNT: usize = VOXELS_PER_AXIS * VOXELS_PER_AXIS * VOXELS_PER_AXIS;

/// Faces per voxel (+X, -X, +Y, -Y, +Z, -Z).
pub const FACE_COUNT: usize = 6;

/// Size of a full voxel mesh in bytes.
pub const VOXEL_BYTES: usize = VOXEL_COUNT * FACE_COUNT;

const COLOR_MASK: u8 = 0x7F;
const GLUE_BIT: u8 = 0x80;

/// One voxel: a packed byte per face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Voxel {
    /// Packed faces (color | glue << 7).
    pub faces: [u8; FACE_COUNT],
}

impl Voxel {
    /// The empty voxel.
    pub const EMPTY: Self = Self { faces: [0; FACE_COUNT] };

    /// Creates a voxel with every face painted `color`.
    #[must_use]
    pub const fn solid(color: u8) -> Self {
        let byte = color & COLOR_MASK;
        Self { faces: [byte; FACE_COUNT] }
    }

    /// Color index of `face`.
    #[inline]
    #[must_use]
    pub const fn color(&self, face: usize) -> u8 {
        self.faces[face] & COLOR_MASK
    }

    /// Glue flag of `face`.
    #[inline]
    #[must_use]
    pub const fn glue(&self, face: usize) -> bool {
        self.faces[face] & GLUE_BIT != 0
    }

    /// Sets the color and glue flag of `face`.
    #[inline]
    pub fn set_face(&mut self, face: usize, color: u8, glue: bool) {
        self.faces[face] = (color & COLOR_MASK) | if glue { GLUE_BIT } else { 0 };
    }

    /// A voxel is empty when its first face is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.faces[0] == 0
    }
}

/// A full 8x8x8 voxel mesh.
#[derive(Clone, PartialEq, Eq)]
pub struct Voxels {
    data: Box<[u8; VOXEL_BYTES]>,
}

impl Voxels {
    /// Creates a mesh of empty voxels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Box::new([0; VOXEL_BYTES]),
        }
    }

    /// Creates a mesh from raw face-major bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidVoxelLength` unless `bytes` is exactly `VOXEL_BYTES` long.
    pub fn from_bytes(bytes: &[u8]) -> PrefabResult<Self> {
        let data: Box<[u8; VOXEL_BYTES]> = bytes
            .to_vec()
            .into_boxed_slice()
            .try_into()
            .map_err(|_| PrefabError::InvalidVoxelLength {
                expected: VOXEL_BYTES,
                actual: bytes.len(),
            })?;
        Ok(Self { data })
    }

    /// Raw face-major bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; VOXEL_BYTES] {
        &self.data
    }

    /// Linear voxel index of `(x, y, z)`, or `None` outside the mesh.
    #[inline]
    #[must_use]
    pub const fn checked_index(x: usize, y: usize, z: usize) -> Option<usize> {
        if x < VOXELS_PER_AXIS && y < VOXELS_PER_AXIS && z < VOXELS_PER_AXIS {
            Some(x + y * VOXELS_PER_AXIS + z * VOXELS_PER_AXIS * VOXELS_PER_AXIS)
        } else {
            None
        }
    }

    /// Linear voxel index of `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics when a coordinate is 8 or more.
    #[inline]
    #[must_use]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        match Self::checked_index(x, y, z) {
            Some(index) => index,
            None => panic!("voxel ({x}, {y}, {z}) outside the mesh"),
        }
    }

    /// Gets the voxel at `(x, y, z)`, or `None` outside the mesh.
    #[must_use]
    pub fn try_get(&self, x: usize, y: usize, z: usize) -> Option<Voxel> {
        let index = Self::checked_index(x, y, z)?;
        let mut voxel = Voxel::EMPTY;
        for (face, byte) in voxel.faces.iter_mut().enumerate() {
            *byte = self.data[index + face * VOXEL_COUNT];
        }
        Some(voxel)
    }

    /// Gets the voxel at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics when a coordinate is 8 or more; see [`Voxels::try_get`].
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Voxel {
        match self.try_get(x, y, z) {
            Some(voxel) => voxel,
            None => panic!("voxel ({x}, {y}, {z}) outside the mesh"),
        }
    }

    /// Sets the voxel at `(x, y, z)`. Returns false outside the mesh.
    pub fn try_set(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) -> bool {
        let Some(index) = Self::checked_index(x, y, z) else {
            return false;
        };
        for (face, byte) in voxel.faces.iter().enumerate() {
            self.data[index + face * VOXEL_COUNT] = *byte;
        }
        true
    }

    /// Sets the voxel at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics when a coordinate is 8 or more; see [`Voxels::try_set`].
    pub fn set(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) {
        if !self.try_set(x, y, z, voxel) {
            panic!("voxel ({x}, {y}, {z}) outside the mesh");
        }
    }

    /// Returns true if every voxel is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data[..VOXEL_COUNT].iter().all(|&b| b == 0)
    }
}

impl Default for Voxels {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Voxels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filled = self.data[..VOXEL_COUNT].iter().filter(|&&b| b != 0).count();
        f.debug_struct("Voxels").field("filled", &filled).finish()
    }
}

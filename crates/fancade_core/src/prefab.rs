//! # Prefabs
//!
//! A prefab is a placeable compound object: up to 64 segments arranged in a
//! 4x4x4 extent, shared metadata, and a grid of block references for the
//! prefabs placed inside it.
//!
//! ## Segment Order
//!
//! Segments are kept in the order their IDs were assigned. Segment `i` of a
//! prefab with ID `p` has ID `p + i`, so this order is the order the
//! segments occupy in the owning `PrefabList`. New positions are inserted
//! after every existing position with a smaller linear key
//! `x + 4y + 16z`. The first segment is the *main* segment.

use crate::error::{PrefabError, PrefabResult};
use crate::grid::BlockData;
use crate::math::{Byte3, Float3, Int3, Ushort3};
use crate::segment::{validate_position, PrefabSegment, MAX_PREFAB_EXTENT, MAX_SEGMENTS};
use crate::voxel::Voxels;

/// Name given to prefabs that were never renamed.
pub const DEFAULT_PREFAB_NAME: &str = "New Block";

/// Background color index used when none is stored.
pub const DEFAULT_BACKGROUND_COLOR: u8 = 30;

/// What kind of object a prefab is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrefabType {
    /// Plain block.
    #[default]
    Normal = 0,
    /// Sound effect.
    Sound = 1,
    /// Physics object.
    Rigid = 2,
    /// Script block.
    Script = 3,
    /// Level.
    Level = 4,
}

impl PrefabType {
    /// Converts from u8.
    #[must_use]
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Normal),
            1 => Some(Self::Sound),
            2 => Some(Self::Rigid),
            3 => Some(Self::Script),
            4 => Some(Self::Level),
            _ => None,
        }
    }
}

/// Collision shape of a prefab.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrefabCollider {
    /// No collision.
    None = 0,
    /// Axis-aligned box.
    #[default]
    Box = 1,
    /// Sphere.
    Sphere = 2,
}

impl PrefabCollider {
    /// Converts from u8.
    #[must_use]
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::Box),
            2 => Some(Self::Sphere),
            _ => None,
        }
    }
}

/// Value of a block setting.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    /// Single byte (options, toggles).
    Byte(u8),
    /// 16-bit value.
    Ushort(u16),
    /// Number.
    Float(f32),
    /// Vector.
    Vec3(Float3),
    /// Text.
    String(String),
}

impl SettingValue {
    /// Type code stored on disk for this value.
    #[must_use]
    pub const fn type_code(&self) -> u8 {
        match self {
            Self::Byte(_) => 1,
            Self::Ushort(_) => 2,
            Self::Float(_) => 4,
            Self::Vec3(_) => 5,
            Self::String(_) => 6,
        }
    }
}

/// A setting attached to a placed block.
#[derive(Clone, Debug, PartialEq)]
pub struct PrefabSetting {
    /// Setting slot on the block.
    pub index: u8,
    /// Grid position of the block the setting belongs to.
    pub position: Ushort3,
    /// The value.
    pub value: SettingValue,
}

/// A wire between two block terminals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Grid position of the source block.
    pub from: Ushort3,
    /// Grid position of the target block.
    pub to: Ushort3,
    /// Terminal voxel on the source block.
    pub from_voxel: Ushort3,
    /// Terminal voxel on the target block.
    pub to_voxel: Ushort3,
}

/// Ordered, position-keyed segment storage.
pub trait SegmentMap {
    /// Segment at `pos`.
    fn segment(&self, pos: Byte3) -> Option<&PrefabSegment>;

    /// Mutable segment at `pos`.
    fn segment_mut(&mut self, pos: Byte3) -> Option<&mut PrefabSegment>;

    /// Inserts a segment at its own position, returning its ordinal.
    fn insert_segment(&mut self, segment: PrefabSegment) -> PrefabResult<usize>;

    /// Removes the segment at `pos`, returning it and the compaction shift
    /// that was subtracted from the remaining positions.
    fn remove_segment(&mut self, pos: Byte3) -> PrefabResult<(PrefabSegment, Int3)>;

    /// Segments in ID order.
    fn ordered_segments(&self) -> std::slice::Iter<'_, PrefabSegment>;

    /// Number of segments.
    fn segment_count(&self) -> usize;
}

/// A prefab and its segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Prefab {
    /// ID of the main segment (assigned by the list).
    pub(crate) id: u16,
    /// Display name.
    pub name: String,
    /// Collision shape.
    pub collider: PrefabCollider,
    /// Object kind.
    pub prefab_type: PrefabType,
    /// Background color index.
    pub background_color: u8,
    /// Whether the player may edit this prefab.
    pub editable: bool,
    /// Settings of placed blocks.
    pub settings: Vec<PrefabSetting>,
    /// Wires between placed blocks.
    pub connections: Vec<Connection>,
    /// Prefabs placed inside this one.
    pub blocks: BlockData,
    /// Segments in ID order.
    segments: Vec<PrefabSegment>,
}

impl Prefab {
    /// Creates a prefab without segments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            collider: PrefabCollider::default(),
            prefab_type: PrefabType::default(),
            background_color: DEFAULT_BACKGROUND_COLOR,
            editable: true,
            settings: Vec::new(),
            connections: Vec::new(),
            blocks: BlockData::new(),
            segments: Vec::new(),
        }
    }

    /// Creates a one-segment prefab.
    #[must_use]
    pub fn single(name: impl Into<String>, voxels: Option<Voxels>) -> Self {
        let mut prefab = Self::new(name);
        prefab.segments.push(PrefabSegment {
            prefab_id: 0,
            pos: Byte3::ZERO,
            voxels,
        });
        prefab
    }

    /// Creates a prefab from segments, inserted in iteration order.
    pub fn with_segments(
        name: impl Into<String>,
        segments: impl IntoIterator<Item = PrefabSegment>,
    ) -> PrefabResult<Self> {
        let mut prefab = Self::new(name);
        for segment in segments {
            prefab.push_segment(segment)?;
        }
        Ok(prefab)
    }

    /// ID of the main segment. Zero until the prefab joins a list.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Returns true if the prefab has no segments.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The first segment in ID order.
    #[must_use]
    pub fn main_segment(&self) -> Option<&PrefabSegment> {
        self.segments.first()
    }

    /// Position of the main segment, or zero for an empty prefab.
    #[must_use]
    pub fn main_pos(&self) -> Int3 {
        self.main_segment().map_or(Int3::ZERO, PrefabSegment::pos_i)
    }

    /// Ordinal (ID offset from the prefab ID) of the segment at `pos`.
    #[must_use]
    pub fn segment_index(&self, pos: Byte3) -> Option<usize> {
        self.segments.iter().position(|s| s.pos == pos)
    }

    /// Segments paired with their IDs.
    pub fn enumerate_with_id(&self) -> impl Iterator<Item = (u16, &PrefabSegment)> + '_ {
        let id = self.id;
        self.segments
            .iter()
            .enumerate()
            .map(move |(i, s)| (id.wrapping_add(i as u16), s))
    }

    /// Ordinal a segment at `pos` would get if inserted now.
    #[must_use]
    pub fn new_segment_index(&self, pos: Byte3) -> usize {
        let key = order_key(pos);
        self.segments.iter().filter(|s| order_key(s.pos) < key).count()
    }

    /// Extent of the segment positions (max position + 1).
    #[must_use]
    pub fn size(&self) -> Int3 {
        self.segments
            .iter()
            .fold(Int3::ZERO, |acc, s| acc.max(s.pos_i() + Int3::ONE))
    }

    /// Shift that removing the segment at `pos` would apply to the others.
    ///
    /// Non-zero only on axes where `pos` was the unique minimum.
    #[must_use]
    pub fn removal_shift(&self, pos: Byte3) -> Int3 {
        let before = self.min_pos(None);
        match self.min_pos(Some(pos)) {
            Some(after) => after - before.unwrap_or(Int3::ZERO),
            None => Int3::ZERO,
        }
    }

    /// Appends a segment after the existing ones, keeping load order.
    pub fn push_segment(&mut self, mut segment: PrefabSegment) -> PrefabResult<usize> {
        self.check_insertable(&segment)?;
        segment.prefab_id = self.id;
        self.segments.push(segment);
        Ok(self.segments.len() - 1)
    }

    /// Sets the prefab ID and every segment back-reference.
    pub(crate) fn set_id(&mut self, id: u16) {
        self.id = id;
        for segment in &mut self.segments {
            segment.prefab_id = id;
        }
    }

    pub(crate) fn check_insertable(&self, segment: &PrefabSegment) -> PrefabResult<()> {
        validate_position(segment.pos)?;
        if self.segments.len() >= MAX_SEGMENTS {
            return Err(PrefabError::TooManySegments { prefab_id: self.id });
        }
        if self.segment_index(segment.pos).is_some() {
            return Err(PrefabError::SegmentOccupied {
                prefab_id: self.id,
                pos: segment.pos,
            });
        }
        Ok(())
    }

    fn min_pos(&self, excluding: Option<Byte3>) -> Option<Int3> {
        self.segments
            .iter()
            .filter(|s| Some(s.pos) != excluding)
            .map(PrefabSegment::pos_i)
            .reduce(Int3::min)
    }
}

impl SegmentMap for Prefab {
    fn segment(&self, pos: Byte3) -> Option<&PrefabSegment> {
        self.segments.iter().find(|s| s.pos == pos)
    }

    fn segment_mut(&mut self, pos: Byte3) -> Option<&mut PrefabSegment> {
        self.segments.iter_mut().find(|s| s.pos == pos)
    }

    fn insert_segment(&mut self, mut segment: PrefabSegment) -> PrefabResult<usize> {
        self.check_insertable(&segment)?;
        let index = self.new_segment_index(segment.pos);
        segment.prefab_id = self.id;
        self.segments.insert(index, segment);
        Ok(index)
    }

    fn remove_segment(&mut self, pos: Byte3) -> PrefabResult<(PrefabSegment, Int3)> {
        let index = self.segment_index(pos).ok_or(PrefabError::SegmentNotFound {
            prefab_id: self.id,
            pos,
        })?;
        let shift = self.removal_shift(pos);
        let removed = self.segments.remove(index);

        if shift != Int3::ZERO {
            for segment in &mut self.segments {
                // Shift never exceeds the remaining minimum, so this stays in 0..4.
                segment.pos = Byte3::try_from_int3(segment.pos_i() - shift).unwrap_or(segment.pos);
            }
        }
        Ok((removed, shift))
    }

    fn ordered_segments(&self) -> std::slice::Iter<'_, PrefabSegment> {
        self.segments.iter()
    }

    fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// Linear sort key of a segment position.
#[inline]
#[must_use]
pub fn order_key(pos: Byte3) -> u32 {
    let extent = u32::from(MAX_PREFAB_EXTENT);
    u32::from(pos.x) + u32::from(pos.y) * extent + u32::from(pos.z) * extent * extent
}

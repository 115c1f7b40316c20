//! # Raw Records
//!
//! One `RawPrefab` per segment, exactly as stored. Every optional field is
//! an `Option` and the header is re-derived from which ones are present, so
//! a record never carries a header that disagrees with its payload.

use fancade_core::{
    Array3D, Byte3, Connection, Int3, PrefabCollider, PrefabSetting, PrefabType, SettingValue, Voxels, VOXEL_BYTES,
};

use crate::error::{CodecError, CodecResult};
use crate::header::PrefabHeader;
use crate::stream::{ByteReader, ByteWriter};

/// Group id marking a record that belongs to no group.
pub const NO_GROUP: u16 = u16::MAX;

/// Membership of a record in a multi-segment prefab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawGroup {
    /// ID of the group's main record.
    pub id: u16,
    /// Segment position inside the prefab.
    pub pos: Byte3,
}

/// A stored segment record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawPrefab {
    /// Object kind.
    pub prefab_type: Option<PrefabType>,
    /// Name, when not the default.
    pub name: Option<String>,
    /// Background color, when not the default.
    pub background_color: Option<u8>,
    /// Set when the player may not edit the prefab.
    pub not_editable: bool,
    /// Collider, when not the default.
    pub collider: Option<PrefabCollider>,
    /// Group membership.
    pub group: Option<RawGroup>,
    /// Voxel mesh.
    pub voxels: Option<Voxels>,
    /// Block grid.
    pub blocks: Option<Array3D<u16>>,
    /// Block settings.
    pub settings: Option<Vec<PrefabSetting>>,
    /// Wires.
    pub connections: Option<Vec<Connection>>,
}

impl RawPrefab {
    /// Header describing the fields present.
    #[must_use]
    pub fn header(&self) -> PrefabHeader {
        let mut header = PrefabHeader::empty();
        header.set(PrefabHeader::HAS_TYPE, self.prefab_type.is_some());
        header.set(PrefabHeader::HAS_NAME, self.name.is_some());
        header.set(PrefabHeader::HAS_BACKGROUND, self.background_color.is_some());
        header.set(PrefabHeader::NOT_EDITABLE, self.not_editable);
        header.set(PrefabHeader::HAS_COLLIDER, self.collider.is_some());
        header.set(PrefabHeader::IN_GROUP, self.group.is_some());
        header.set(PrefabHeader::HAS_VOXELS, self.voxels.is_some());
        header.set(PrefabHeader::HAS_BLOCKS, self.blocks.is_some());
        header.set(PrefabHeader::HAS_SETTINGS, self.settings.is_some());
        header.set(PrefabHeader::HAS_CONNECTIONS, self.connections.is_some());
        header
    }

    /// Returns true if the record carries any prefab-level field.
    ///
    /// Only the main record of a group may.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.prefab_type.is_some()
            || self.name.is_some()
            || self.background_color.is_some()
            || self.not_editable
            || self.collider.is_some()
            || self.blocks.is_some()
            || self.settings.is_some()
            || self.connections.is_some()
    }

    /// Group id, or [`NO_GROUP`].
    #[must_use]
    pub fn group_id(&self) -> u16 {
        self.group.map_or(NO_GROUP, |g| g.id)
    }

    /// Reads one record.
    pub fn read(reader: &mut ByteReader<'_>) -> CodecResult<Self> {
        let header = PrefabHeader::parse(reader.read_u16()?)?;
        let mut raw = Self {
            not_editable: header.contains(PrefabHeader::NOT_EDITABLE),
            ..Self::default()
        };

        if header.contains(PrefabHeader::HAS_TYPE) {
            let v = reader.read_u8()?;
            raw.prefab_type = Some(PrefabType::from_u8(v).ok_or(CodecError::UnknownPrefabType(v))?);
        }
        if header.contains(PrefabHeader::HAS_NAME) {
            raw.name = Some(reader.read_string()?);
        }
        if header.contains(PrefabHeader::HAS_BACKGROUND) {
            raw.background_color = Some(reader.read_u8()?);
        }
        if header.contains(PrefabHeader::HAS_COLLIDER) {
            let v = reader.read_u8()?;
            raw.collider = Some(PrefabCollider::from_u8(v).ok_or(CodecError::UnknownCollider(v))?);
        }
        if header.contains(PrefabHeader::IN_GROUP) {
            let id = reader.read_u16()?;
            let pos = reader.read_byte3()?;
            raw.group = Some(RawGroup { id, pos });
        }
        if header.contains(PrefabHeader::HAS_VOXELS) {
            raw.voxels = Some(Voxels::from_bytes(reader.read_bytes(VOXEL_BYTES)?)?);
        }
        if header.contains(PrefabHeader::HAS_BLOCKS) {
            raw.blocks = Some(read_blocks(reader)?);
        }
        if header.contains(PrefabHeader::HAS_SETTINGS) {
            let count = reader.read_u16()?;
            let mut settings = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                settings.push(read_setting(reader)?);
            }
            raw.settings = Some(settings);
        }
        if header.contains(PrefabHeader::HAS_CONNECTIONS) {
            let count = reader.read_u16()?;
            let mut connections = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                connections.push(Connection {
                    from: reader.read_ushort3()?,
                    to: reader.read_ushort3()?,
                    from_voxel: reader.read_ushort3()?,
                    to_voxel: reader.read_ushort3()?,
                });
            }
            raw.connections = Some(connections);
        }
        Ok(raw)
    }

    /// Writes this record.
    pub fn write(&self, writer: &mut ByteWriter) -> CodecResult<()> {
        writer.write_u16(self.header().bits());

        if let Some(prefab_type) = self.prefab_type {
            writer.write_u8(prefab_type as u8);
        }
        if let Some(name) = &self.name {
            writer.write_string(name)?;
        }
        if let Some(color) = self.background_color {
            writer.write_u8(color);
        }
        if let Some(collider) = self.collider {
            writer.write_u8(collider as u8);
        }
        if let Some(group) = self.group {
            writer.write_u16(group.id);
            writer.write_byte3(group.pos);
        }
        if let Some(voxels) = &self.voxels {
            writer.write_bytes(voxels.as_bytes());
        }
        if let Some(blocks) = &self.blocks {
            write_blocks(writer, blocks)?;
        }
        if let Some(settings) = &self.settings {
            writer.write_count_u16(settings.len())?;
            for setting in settings {
                write_setting(writer, setting)?;
            }
        }
        if let Some(connections) = &self.connections {
            writer.write_count_u16(connections.len())?;
            for c in connections {
                writer.write_ushort3(c.from);
                writer.write_ushort3(c.to);
                writer.write_ushort3(c.from_voxel);
                writer.write_ushort3(c.to_voxel);
            }
        }
        Ok(())
    }
}

fn read_blocks(reader: &mut ByteReader<'_>) -> CodecResult<Array3D<u16>> {
    let size = reader.read_ushort3()?;
    let count = usize::from(size.x) * usize::from(size.y) * usize::from(size.z);
    let cells = reader.read_u16_slice(count)?;
    Ok(Array3D::from_vec(Int3::from(size), cells)?)
}

fn write_blocks(writer: &mut ByteWriter, blocks: &Array3D<u16>) -> CodecResult<()> {
    let size = blocks.size();
    for axis in [size.x, size.y, size.z] {
        let axis = u16::try_from(axis).map_err(|_| CodecError::TooManyItems(axis as usize))?;
        writer.write_u16(axis);
    }
    writer.write_u16_slice(blocks.as_slice());
    Ok(())
}

fn read_setting(reader: &mut ByteReader<'_>) -> CodecResult<PrefabSetting> {
    let index = reader.read_u8()?;
    let type_code = reader.read_u8()?;
    let position = reader.read_ushort3()?;
    let value = match type_code {
        1 => SettingValue::Byte(reader.read_u8()?),
        2 => SettingValue::Ushort(reader.read_u16()?),
        4 => SettingValue::Float(reader.read_f32()?),
        5 => SettingValue::Vec3(reader.read_float3()?),
        6 => SettingValue::String(reader.read_string()?),
        other => return Err(CodecError::UnknownSettingType(other)),
    };
    Ok(PrefabSetting { index, position, value })
}

fn write_setting(writer: &mut ByteWriter, setting: &PrefabSetting) -> CodecResult<()> {
    writer.write_u8(setting.index);
    writer.write_u8(setting.value.type_code());
    writer.write_ushort3(setting.position);
    match &setting.value {
        SettingValue::Byte(v) => writer.write_u8(*v),
        SettingValue::Ushort(v) => writer.write_u16(*v),
        SettingValue::Float(v) => writer.write_f32(*v),
        SettingValue::Vec3(v) => writer.write_float3(*v),
        SettingValue::String(v) => writer.write_string(v)?,
    }
    Ok(())
}

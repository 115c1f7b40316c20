//! # Stock Catalog
//!
//! Built-in prefabs ship as a prefab-list blob:
//!
//! ```text
//! u32     record count
//! u16     id offset
//! record* (see raw.rs)
//! ```
//!
//! The blob may be zlib-compressed. Games only reference stock prefabs by
//! ID, so the catalog exposes lookup and enumeration and nothing else.

use fancade_core::{Prefab, PrefabList, PrefabSegment};

use crate::compression::{compress, decompress};
use crate::convert::{list_to_records, records_to_list};
use crate::error::CodecResult;
use crate::raw::RawPrefab;
use crate::stream::{ByteReader, ByteWriter};

/// Read access to built-in prefabs.
pub trait StockCatalog {
    /// Prefab whose main segment has ID `id`.
    fn get(&self, id: u16) -> Option<&Prefab>;

    /// All prefabs in ID order.
    fn iter(&self) -> Box<dyn Iterator<Item = &Prefab> + '_>;
}

/// Reads a prefab-list blob.
pub fn read_prefab_list(reader: &mut ByteReader<'_>) -> CodecResult<PrefabList> {
    let count = reader.read_u32()?;
    let id_offset = reader.read_u16()?;
    // Every record is at least its two header bytes.
    let mut records = Vec::with_capacity((count as usize).min(reader.remaining() / 2));
    for _ in 0..count {
        records.push(RawPrefab::read(reader)?);
    }
    records_to_list(id_offset, records)
}

/// Writes a prefab-list blob.
pub fn write_prefab_list(writer: &mut ByteWriter, list: &PrefabList) -> CodecResult<()> {
    let records = list_to_records(list);
    writer.write_count_u32(records.len())?;
    writer.write_u16(list.id_offset());
    for raw in &records {
        raw.write(writer)?;
    }
    Ok(())
}

/// Stock prefabs decoded from a blob.
#[derive(Clone, Debug)]
pub struct StockPrefabs {
    list: PrefabList,
}

impl StockPrefabs {
    /// Wraps an already decoded list.
    #[must_use]
    pub const fn new(list: PrefabList) -> Self {
        Self { list }
    }

    /// Decodes an uncompressed blob.
    pub fn from_bytes(data: &[u8]) -> CodecResult<Self> {
        let list = read_prefab_list(&mut ByteReader::new(data))?;
        tracing::debug!("Loaded {} stock prefabs from id {}", list.prefab_count(), list.id_offset());
        Ok(Self::new(list))
    }

    /// Decodes a zlib-compressed blob.
    pub fn from_compressed(data: &[u8]) -> CodecResult<Self> {
        Self::from_bytes(&decompress(data)?)
    }

    /// Encodes the catalog as a zlib-compressed blob.
    pub fn to_compressed(&self, level: u32) -> CodecResult<Vec<u8>> {
        let mut writer = ByteWriter::new();
        write_prefab_list(&mut writer, &self.list)?;
        compress(writer.as_slice(), level)
    }

    /// Segment with ID `id`.
    #[must_use]
    pub fn segment(&self, id: u16) -> Option<&PrefabSegment> {
        self.list.segment(id)
    }

    /// The underlying list.
    #[must_use]
    pub const fn list(&self) -> &PrefabList {
        &self.list
    }
}

impl StockCatalog for StockPrefabs {
    fn get(&self, id: u16) -> Option<&Prefab> {
        self.list.prefab(id)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Prefab> + '_> {
        Box::new(self.list.prefabs())
    }
}

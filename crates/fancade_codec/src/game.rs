//! # Game Files
//!
//! Envelope of a whole game:
//!
//! ```text
//! u16     version
//! string  name
//! string  author
//! string  description
//! u16     id offset
//! u16/u32 record count
//! record* (see raw.rs)
//! ```
//!
//! The record count is a `u32` in files older than
//! [`SHORT_COUNT_VERSION`] and a `u16` from then on.
//!
//! Files on disk wrap this in a zlib stream.
//!
//! ## Fix and Update
//!
//! Older files were saved when the stock catalog was smaller, so their
//! custom IDs start lower. With `fix_and_update` the load path shifts every
//! custom reference up to [`CURRENT_ID_OFFSET`] and marks the game as
//! current.

use std::fs;
use std::path::Path;

use fancade_core::{PrefabList, DEFAULT_ID_OFFSET};

use crate::compression::{compress, decompress};
use crate::config::CodecConfig;
use crate::convert::{list_to_records, records_to_list, shift_ids};
use crate::error::{CodecError, CodecResult};
use crate::raw::RawPrefab;
use crate::stream::{ByteReader, ByteWriter};

/// Version written by this codec.
pub const CURRENT_VERSION: u16 = 31;

/// Oldest version this codec reads.
pub const MIN_SUPPORTED_VERSION: u16 = 27;

/// First version whose record count is a `u16`.
pub const SHORT_COUNT_VERSION: u16 = 31;

/// First custom ID of the current stock catalog.
pub const CURRENT_ID_OFFSET: u16 = DEFAULT_ID_OFFSET;

/// A game: metadata plus its custom prefabs.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    /// Format version the game was loaded from or will be saved as.
    pub version: u16,
    /// Title.
    pub name: String,
    /// Author name.
    pub author: String,
    /// Description.
    pub description: String,
    /// Custom prefabs.
    pub prefabs: PrefabList,
}

impl Game {
    /// Creates an empty game at the current version.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            name: name.into(),
            author: "Unknown Author".to_owned(),
            description: String::new(),
            prefabs: PrefabList::new(CURRENT_ID_OFFSET),
        }
    }

    /// Reads an uncompressed game.
    pub fn read(reader: &mut ByteReader<'_>, fix_and_update: bool) -> CodecResult<Self> {
        let mut version = reader.read_u16()?;
        check_version(version)?;

        let name = reader.read_string()?;
        let author = reader.read_string()?;
        let description = reader.read_string()?;
        let mut id_offset = reader.read_u16()?;
        let count = if version < SHORT_COUNT_VERSION {
            reader.read_u32()? as usize
        } else {
            usize::from(reader.read_u16()?)
        };

        // each record is at least its two header bytes
        let mut records = Vec::with_capacity(count.min(reader.remaining() / 2));
        for _ in 0..count {
            records.push(RawPrefab::read(reader)?);
        }

        if fix_and_update && id_offset < CURRENT_ID_OFFSET {
            let delta = CURRENT_ID_OFFSET - id_offset;
            shift_ids(&mut records, id_offset, delta)?;
            tracing::debug!(
                "Fixed game '{}' from version {} (id offset {} -> {})",
                name,
                version,
                id_offset,
                CURRENT_ID_OFFSET
            );
            id_offset = CURRENT_ID_OFFSET;
            version = CURRENT_VERSION;
        }

        let prefabs = records_to_list(id_offset, records)?;
        tracing::debug!("Loaded game '{}' v{} ({} prefabs)", name, version, prefabs.prefab_count());

        Ok(Self {
            version,
            name,
            author,
            description,
            prefabs,
        })
    }

    /// Writes the game uncompressed, stamped with `version`.
    pub fn write(&self, writer: &mut ByteWriter, version: u16) -> CodecResult<()> {
        check_version(version)?;
        writer.write_u16(version);
        writer.write_string(&self.name)?;
        writer.write_string(&self.author)?;
        writer.write_string(&self.description)?;
        writer.write_u16(self.prefabs.id_offset());

        let records = list_to_records(&self.prefabs);
        if version < SHORT_COUNT_VERSION {
            writer.write_count_u32(records.len())?;
        } else {
            writer.write_count_u16(records.len())?;
        }
        for raw in &records {
            raw.write(writer)?;
        }
        Ok(())
    }

    /// Decodes a zlib-compressed game.
    pub fn from_bytes(data: &[u8], config: &CodecConfig) -> CodecResult<Self> {
        let raw = decompress(data)?;
        Self::read(&mut ByteReader::new(&raw), config.fix_and_update)
    }

    /// Encodes the game as a zlib stream at `config.save_version`.
    pub fn to_bytes(&self, config: &CodecConfig) -> CodecResult<Vec<u8>> {
        let mut writer = ByteWriter::with_capacity(1024);
        self.write(&mut writer, config.save_version)?;
        let packed = compress(writer.as_slice(), config.compression_level)?;
        tracing::debug!("Saved game '{}': {} bytes, {} compressed", self.name, writer.len(), packed.len());
        Ok(packed)
    }

    /// Loads a compressed game file.
    pub fn load_file(path: impl AsRef<Path>, config: &CodecConfig) -> CodecResult<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data, config)
    }

    /// Saves a compressed game file.
    pub fn save_file(&self, path: impl AsRef<Path>, config: &CodecConfig) -> CodecResult<()> {
        fs::write(path, self.to_bytes(config)?)?;
        Ok(())
    }
}

fn check_version(version: u16) -> CodecResult<()> {
    if (MIN_SUPPORTED_VERSION..=CURRENT_VERSION).contains(&version) {
        Ok(())
    } else {
        Err(CodecError::UnsupportedVersion {
            version,
            min: MIN_SUPPORTED_VERSION,
            max: CURRENT_VERSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_game_layout() {
        let mut game = Game::new("G");
        game.author = "A".to_owned();

        let mut writer = ByteWriter::new();
        game.write(&mut writer, CURRENT_VERSION).unwrap();
        let offset = CURRENT_ID_OFFSET.to_le_bytes();
        assert_eq!(
            writer.as_slice(),
            &[31, 0, 1, b'G', 1, b'A', 0, offset[0], offset[1], 0, 0]
        );

        let back = Game::read(&mut ByteReader::new(writer.as_slice()), true).unwrap();
        assert_eq!(back, game);
    }

    #[test]
    fn test_count_width_follows_version() {
        let game = Game::new("G");
        let mut old = ByteWriter::new();
        game.write(&mut old, SHORT_COUNT_VERSION - 1).unwrap();
        let mut current = ByteWriter::new();
        game.write(&mut current, SHORT_COUNT_VERSION).unwrap();
        assert_eq!(old.len(), current.len() + 2);
        assert_eq!(&old.as_slice()[old.len() - 4..], &[0, 0, 0, 0]);

        let back = Game::read(&mut ByteReader::new(old.as_slice()), false).unwrap();
        assert_eq!(back.version, SHORT_COUNT_VERSION - 1);
        assert_eq!(back.prefabs, game.prefabs);
    }

    #[test]
    fn test_wide_count_is_bounded_by_input() {
        let mut writer = ByteWriter::new();
        writer.write_u16(MIN_SUPPORTED_VERSION);
        for _ in 0..3 {
            writer.write_string("").unwrap();
        }
        writer.write_u16(CURRENT_ID_OFFSET);
        writer.write_u32(u32::MAX);
        assert!(matches!(
            Game::read(&mut ByteReader::new(writer.as_slice()), false),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_version_bounds() {
        let game = Game::new("G");
        let mut writer = ByteWriter::new();
        assert!(matches!(
            game.write(&mut writer, CURRENT_VERSION + 1),
            Err(CodecError::UnsupportedVersion { version: 32, .. })
        ));
        assert!(matches!(
            Game::read(&mut ByteReader::new(&[26, 0]), true),
            Err(CodecError::UnsupportedVersion { version: 26, min: 27, max: 31 })
        ));
    }
}

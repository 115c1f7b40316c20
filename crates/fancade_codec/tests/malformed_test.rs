//! Malformed input must fail with a typed error.

use fancade_codec::{
    decompress, ByteReader, ByteWriter, CodecConfig, CodecError, Game, PrefabHeader, CURRENT_ID_OFFSET,
    CURRENT_VERSION,
};
use fancade_core::{Byte3, Int3, Prefab, PrefabSegment, PrefabSetting, SettingValue, Ushort3, Voxels};

/// Envelope up to and including the record count.
fn envelope(version: u16, count: u16) -> ByteWriter {
    let mut writer = ByteWriter::new();
    writer.write_u16(version);
    writer.write_string("Broken").unwrap();
    writer.write_string("").unwrap();
    writer.write_string("").unwrap();
    writer.write_u16(CURRENT_ID_OFFSET);
    writer.write_u16(count);
    writer
}

fn read(bytes: &[u8]) -> Result<Game, CodecError> {
    Game::read(&mut ByteReader::new(bytes), true)
}

fn sample_game() -> Game {
    let mut game = Game::new("Sample");
    let cube = game
        .prefabs
        .add_prefab(
            Prefab::with_segments(
                "Cube",
                vec![
                    PrefabSegment::new(Byte3::ZERO, Some(Voxels::new())).unwrap(),
                    PrefabSegment::new(Byte3::new(0, 1, 0), None).unwrap(),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let level = game.prefabs.add_prefab(Prefab::single("Level", None)).unwrap();
    game.prefabs.place_prefab(level, Int3::new(1, 0, 1), cube, false, None).unwrap();
    game.prefabs.prefab_mut(level).unwrap().settings_mut().push(PrefabSetting {
        index: 0,
        position: Ushort3::new(1, 0, 1),
        value: SettingValue::String("hello".to_owned()),
    });
    game
}

#[test]
fn test_every_truncation_is_detected() {
    let mut writer = ByteWriter::new();
    sample_game().write(&mut writer, CURRENT_VERSION).unwrap();
    let bytes = writer.as_slice();

    for len in 0..bytes.len() {
        assert!(
            matches!(read(&bytes[..len]), Err(CodecError::Truncated { .. })),
            "prefix of {len} bytes was not reported as truncated"
        );
    }
    assert!(read(bytes).is_ok());
}

#[test]
fn test_unsupported_versions() {
    for version in [0, 26, CURRENT_VERSION + 1, u16::MAX] {
        let writer = envelope(version, 0);
        assert!(
            matches!(read(writer.as_slice()), Err(CodecError::UnsupportedVersion { version: v, .. }) if v == version),
            "version {version} was accepted"
        );
    }
}

#[test]
fn test_unknown_setting_type() {
    let mut writer = envelope(CURRENT_VERSION, 1);
    writer.write_u16(PrefabHeader::HAS_SETTINGS.bits());
    writer.write_u16(1);
    writer.write_u8(0);
    writer.write_u8(9);
    writer.write_ushort3(Ushort3::default());
    writer.write_u8(0);
    assert!(matches!(read(writer.as_slice()), Err(CodecError::UnknownSettingType(9))));
}

#[test]
fn test_unknown_header_bits() {
    let mut writer = envelope(CURRENT_VERSION, 1);
    writer.write_u16(1 << 14);
    assert!(matches!(read(writer.as_slice()), Err(CodecError::UnknownHeaderBits(0x4000))));
}

#[test]
fn test_unknown_enum_bytes() {
    let mut writer = envelope(CURRENT_VERSION, 1);
    writer.write_u16(PrefabHeader::HAS_TYPE.bits());
    writer.write_u8(5);
    assert!(matches!(read(writer.as_slice()), Err(CodecError::UnknownPrefabType(5))));

    let mut writer = envelope(CURRENT_VERSION, 1);
    writer.write_u16(PrefabHeader::HAS_COLLIDER.bits());
    writer.write_u8(3);
    assert!(matches!(read(writer.as_slice()), Err(CodecError::UnknownCollider(3))));
}

#[test]
fn test_block_grid_larger_than_input() {
    let mut writer = envelope(CURRENT_VERSION, 1);
    writer.write_u16(PrefabHeader::HAS_BLOCKS.bits());
    writer.write_ushort3(Ushort3::new(1000, 1000, 1000));
    writer.write_u16_slice(&[0; 16]);
    assert!(matches!(read(writer.as_slice()), Err(CodecError::Truncated { .. })));
}

#[test]
fn test_duplicate_group_position() {
    let mut writer = envelope(CURRENT_VERSION, 2);
    for _ in 0..2 {
        writer.write_u16(PrefabHeader::IN_GROUP.bits());
        writer.write_u16(CURRENT_ID_OFFSET);
        writer.write_byte3(Byte3::ZERO);
    }
    assert!(matches!(read(writer.as_slice()), Err(CodecError::Prefab(_))));
}

#[test]
fn test_corrupt_compressed_stream() {
    let config = CodecConfig::default();
    let mut packed = sample_game().to_bytes(&config).unwrap();
    packed.truncate(packed.len() / 2);
    assert!(matches!(
        Game::from_bytes(&packed, &config),
        Err(CodecError::Io(_) | CodecError::Truncated { .. })
    ));
    assert!(matches!(decompress(b"not zlib"), Err(CodecError::Io(_))));
}

//! zlib envelope of save files.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::CodecResult;

/// Highest zlib compression level.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Compresses `data` into a zlib stream. Levels above 9 are clamped.
pub fn compress(data: &[u8], level: u32) -> CodecResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 4),
        Compression::new(level.min(MAX_COMPRESSION_LEVEL)),
    );
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompresses a zlib stream.
pub fn decompress(data: &[u8]) -> CodecResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn test_levels_roundtrip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 7) as u8).collect();
        for level in [0, 6, 9, 42] {
            let packed = compress(&data, level).unwrap();
            assert_eq!(decompress(&packed).unwrap(), data);
        }
        assert!(compress(&data, 9).unwrap().len() < data.len());
    }

    #[test]
    fn test_garbage_is_io_error() {
        assert!(matches!(decompress(&[1, 2, 3, 4]), Err(CodecError::Io(_))));
    }
}

//! # Codec Error Types
//!
//! All errors that can occur while reading or writing save files.

use std::io;

use fancade_core::PrefabError;
use thiserror::Error;

/// Errors that can occur in the codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Underlying reader or writer failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The input ended before a declared field.
    #[error("unexpected end of input: {needed} more bytes needed")]
    Truncated {
        /// Bytes missing for the field being read.
        needed: usize,
    },

    /// The file version is outside the supported range.
    #[error("unsupported format version {version} (supported {min}..={max})")]
    UnsupportedVersion {
        /// Version found in the file.
        version: u16,
        /// Oldest supported version.
        min: u16,
        /// Current version.
        max: u16,
    },

    /// A record header has bits this codec does not know.
    #[error("unknown record header bits {0:#06x}")]
    UnknownHeaderBits(u16),

    /// Prefab type byte out of range.
    #[error("unknown prefab type {0}")]
    UnknownPrefabType(u8),

    /// Collider byte out of range.
    #[error("unknown collider {0}")]
    UnknownCollider(u8),

    /// Setting value type code out of range.
    #[error("unknown setting type {0}")]
    UnknownSettingType(u8),

    /// A string does not fit its one-byte length prefix.
    #[error("string of {0} bytes exceeds the 255 byte limit")]
    StringTooLong(usize),

    /// A list does not fit its count prefix.
    #[error("too many items for count field: {0}")]
    TooManyItems(usize),

    /// A string is not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    /// Group records that do not form a prefab.
    #[error("invalid group at record {record}: group id {group_id}, expected {expected}")]
    InvalidGroup {
        /// Index of the first record of the run.
        record: usize,
        /// Group id stored in the record.
        group_id: u16,
        /// ID of the run's first record.
        expected: u16,
    },

    /// Decoded records violate a data model invariant.
    #[error("invalid prefab data: {0}")]
    Prefab(#[from] PrefabError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

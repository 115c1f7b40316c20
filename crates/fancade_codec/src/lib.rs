//! # Fancade Codec
//!
//! Binary save format for Fancade games and prefab lists.
//!
//! ## Design Principles
//!
//! 1. **Stateless**: every function maps bytes to `fancade_core` types and
//!    back; options are passed in, never read from globals
//! 2. **Typed failures**: truncated input, unknown discriminants and
//!    unsupported versions are errors, never guessed around
//! 3. **Header from content**: record headers are derived from the fields
//!    present at write time
//!
//! ## Core Components
//!
//! - `ByteReader` / `ByteWriter`: little-endian primitives
//! - `PrefabHeader` / `RawPrefab`: one bit-packed record per segment
//! - `records_to_list` / `list_to_records`: group runs ⇄ `PrefabList`
//! - `Game`: versioned envelope with the ID fix-up pass
//! - `StockPrefabs`: stock catalog decoded from a prefab-list blob
//! - `CodecConfig`: compression level, fix-up toggle, save version
//!
//! ## Example
//!
//! ```rust,ignore
//! use fancade_codec::{CodecConfig, Game};
//!
//! let config = CodecConfig::from_toml_str(&std::fs::read_to_string("codec.toml")?)?;
//! let game = Game::load_file("game.fcg", &config)?;
//! game.save_file("copy.fcg", &config)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod compression;
pub mod config;
pub mod convert;
pub mod error;
pub mod game;
pub mod header;
pub mod raw;
pub mod stream;

pub use catalog::{read_prefab_list, write_prefab_list, StockCatalog, StockPrefabs};
pub use compression::{compress, decompress, MAX_COMPRESSION_LEVEL};
pub use config::CodecConfig;
pub use convert::{list_to_records, records_to_list, shift_ids};
pub use error::{CodecError, CodecResult};
pub use game::{Game, CURRENT_ID_OFFSET, CURRENT_VERSION, MIN_SUPPORTED_VERSION, SHORT_COUNT_VERSION};
pub use header::PrefabHeader;
pub use raw::{RawGroup, RawPrefab, NO_GROUP};
pub use stream::{ByteReader, ByteWriter, MAX_STRING_LEN};

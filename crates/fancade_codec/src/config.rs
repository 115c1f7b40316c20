//! # Codec Configuration
//!
//! Options for loading and saving, usually read once from a TOML file:
//!
//! ```toml
//! compression_level = 9
//! fix_and_update = true
//! save_version = 31
//! ```
//!
//! Missing keys fall back to the defaults.

use serde::Deserialize;

use crate::compression::MAX_COMPRESSION_LEVEL;
use crate::error::{CodecError, CodecResult};
use crate::game::{CURRENT_VERSION, MIN_SUPPORTED_VERSION};

/// Load and save options.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// zlib level, 0..=9.
    pub compression_level: u32,
    /// Shift IDs of files saved against a smaller stock catalog and bump
    /// their version on load.
    pub fix_and_update: bool,
    /// Version written by `Game` saves.
    pub save_version: u16,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            fix_and_update: true,
            save_version: CURRENT_VERSION,
        }
    }
}

impl CodecConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> CodecResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| CodecError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> CodecResult<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(CodecError::Config(format!(
                "compression_level {} exceeds {}",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }
        if !(MIN_SUPPORTED_VERSION..=CURRENT_VERSION).contains(&self.save_version) {
            return Err(CodecError::Config(format!(
                "save_version {} outside {}..={}",
                self.save_version, MIN_SUPPORTED_VERSION, CURRENT_VERSION
            )));
        }
        Ok(())
    }
}

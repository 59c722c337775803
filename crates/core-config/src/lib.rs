//! Engine configuration.
//!
//! Settings the command-execution core consults at runtime: the tab stop used
//! for block-wise column math, the number formats recognized by
//! increment/decrement, and virtual-edit behavior. Values deserialize from
//! TOML with full `Default` fallbacks; a missing or partial file is never an
//! error, only a malformed one is.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Number formats `AddToWord` / `SubtractFromWord` will recognize, tried in
/// hex > octal > decimal > alpha priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumberFormats {
    pub decimal: bool,
    pub hex: bool,
    /// Off by default: matches modern Vim's default `nrformats`, where a
    /// leading zero no longer implies octal.
    pub octal: bool,
    /// Alphabetic increment (`nrformats+=alpha`), off by default.
    pub alpha: bool,
}

impl Default for NumberFormats {
    fn default() -> Self {
        Self {
            decimal: true,
            hex: true,
            octal: false,
            alpha: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tab stop in display cells; drives block-span column arithmetic.
    pub tabstop: usize,
    /// Allow the caret to rest past end-of-line (block visual / virtual edit).
    pub virtual_edit: bool,
    pub number_formats: NumberFormats,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tabstop: 8,
            virtual_edit: false,
            number_formats: NumberFormats::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string; unspecified fields take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("malformed engine config")
    }

    /// Candidate user config path (`<config dir>/vimcore/config.toml`).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vimcore").join("config.toml"))
    }

    /// Load the user config if present, defaults otherwise. Only a malformed
    /// file is an error.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::user_config_path() else {
            warn!(target: "config", "no config directory resolved; using defaults");
            return Ok(Self::default());
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let cfg = Self::from_toml_str(&contents)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                debug!(target: "config", path = %path.display(), "loaded engine config");
                Ok(cfg)
            }
            Err(_) => {
                debug!(target: "config", path = %path.display(), "no user config; using defaults");
                Ok(Self::default())
            }
        }
    }
}

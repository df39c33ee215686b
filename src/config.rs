//! Configuration loading
//!
//! `defaults/glint.default.toml` is embedded into the crate so the documented
//! defaults and [`HighlightConfig::default`] never drift apart. Applications layer
//! their own files and overrides on top of it with [`Loader`] before deserializing.

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/glint.default.toml");

/// Options consumed by [`crate::Highlighter`] and the output formats.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Swallow internal engine faults into a plain-text result instead of failing.
    pub safe_mode: bool,
    pub class_prefix: String,
    /// Replacement for tabs in leading indentation, applied by
    /// [`crate::formats::fix_markup`].
    pub tab_replace: Option<String>,
    /// Turn line breaks into `<br>` in [`crate::formats::fix_markup`].
    pub use_br: bool,
    /// Auto-detection candidates used when a call does not name any.
    pub languages: Option<Vec<String>>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            class_prefix: "hljs-".to_string(),
            tab_replace: None,
            use_br: false,
            languages: None,
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. from a command-line flag.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<HighlightConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

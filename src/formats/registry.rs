//! Format registry for highlight results
//!
//! Each format implements [`Formatter`] and is registered with [`FormatRegistry`]
//! under its name.

use crate::config::HighlightConfig;
use crate::parsing::HighlightResult;
use std::collections::HashMap;

/// Error that can occur during formatting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("format '{0}' not found")]
    FormatNotFound(String),
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Turns a [`HighlightResult`] into text.
pub trait Formatter: Send + Sync {
    /// The name of this format (e.g., "html", "json")
    fn name(&self) -> &str;

    fn serialize(&self, result: &HighlightResult) -> Result<String, FormatError>;

    fn description(&self) -> &str {
        ""
    }
}

pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter, replacing any formatter of the same name.
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Serialize a result using the named format
    pub fn serialize(&self, result: &HighlightResult, format: &str) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(result)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Built-in formats, with HTML rendered according to `config`.
    pub fn with_config(config: &HighlightConfig) -> Self {
        let mut registry = Self::new();
        registry.register(super::HtmlFormatter::new(config.clone()));
        registry.register(super::JsonFormatter);
        registry.register(super::TreevizFormatter);
        registry
    }

    /// Built-in formats with the default configuration.
    pub fn with_defaults() -> Self {
        Self::with_config(&HighlightConfig::default())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::PLAINTEXT;

    struct TestFormatter;
    impl Formatter for TestFormatter {
        fn name(&self) -> &str {
            "test"
        }
        fn serialize(&self, result: &HighlightResult) -> Result<String, FormatError> {
            Ok(format!("test output for {}", result.language))
        }
        fn description(&self) -> &str {
            "Test formatter"
        }
    }

    #[test]
    fn test_registry_register() {
        let mut registry = FormatRegistry::new();
        assert!(!registry.has("test"));
        registry.register(TestFormatter);

        assert!(registry.has("test"));
        assert_eq!(registry.list_formats(), vec!["test"]);
        assert_eq!(registry.get("test").unwrap().description(), "Test formatter");
    }

    #[test]
    fn test_registry_serialize() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormatter);

        let result = HighlightResult::plaintext(PLAINTEXT, "x");
        assert_eq!(
            registry.serialize(&result, "test").unwrap(),
            "test output for plaintext"
        );
    }

    #[test]
    fn test_registry_serialize_not_found() {
        let registry = FormatRegistry::new();
        let result = HighlightResult::plaintext(PLAINTEXT, "x");

        assert_eq!(
            registry.serialize(&result, "nonexistent").unwrap_err(),
            FormatError::FormatNotFound("nonexistent".to_string())
        );
    }

    #[test]
    fn test_default_formats() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.list_formats(), vec!["html", "json", "treeviz"]);
    }
}

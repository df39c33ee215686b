//! Grammar registry and public highlighting API
//!
//! A [`Highlighter`] owns its grammars; there is no process-wide registry. Grammars
//! are registered once, up front, and compiled the first time they are used. The
//! compiled form is cached per grammar behind a [`OnceCell`], so a `Highlighter`
//! shared between threads compiles each grammar at most once.

use crate::compiling::{compile_grammar, CompiledGrammar};
use crate::config::HighlightConfig;
use crate::detection;
use crate::error::{GrammarError, HighlightError};
use crate::grammar::GrammarDef;
use crate::languages;
use crate::parsing::engine::highlight_compiled;
use crate::parsing::{Continuation, HighlightResult};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A registered grammar: its definition plus the compiled form, built on first use.
#[derive(Debug)]
pub struct Grammar {
    definition: GrammarDef,
    compiled: OnceCell<CompiledGrammar>,
}

impl Grammar {
    fn new(definition: GrammarDef) -> Self {
        Self {
            definition,
            compiled: OnceCell::new(),
        }
    }

    pub fn definition(&self) -> &GrammarDef {
        &self.definition
    }

    /// Compile the grammar, or return the result of the first successful compilation.
    pub fn compiled(&self) -> Result<&CompiledGrammar, GrammarError> {
        self.compiled
            .get_or_try_init(|| compile_grammar(&self.definition))
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Whether the grammar takes part in auto-detection.
    pub fn auto_detect(&self) -> bool {
        !self.definition.disable_autodetect
    }
}

#[derive(Debug, Default)]
pub struct Highlighter {
    config: HighlightConfig,
    grammars: HashMap<String, Grammar>,
    /// Registered names in registration order.
    order: Vec<String>,
    /// Alias to registered name.
    aliases: HashMap<String, String>,
}

impl Highlighter {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// A highlighter with the default configuration and every bundled grammar.
    pub fn with_bundled_languages() -> Self {
        let mut highlighter = Self::default();
        languages::register_all(&mut highlighter);
        highlighter
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    pub fn configure(&mut self, config: HighlightConfig) {
        self.config = config;
    }

    /// Register a grammar under `name`, along with the aliases it declares.
    ///
    /// `define` builds the grammar and may look up grammars registered earlier. If it
    /// fails, safe mode registers an always-plain-text stand-in and logs a warning;
    /// otherwise the failure is returned and nothing is registered.
    pub fn register_grammar<F>(&mut self, name: &str, define: F) -> Result<(), HighlightError>
    where
        F: FnOnce(&Highlighter) -> Result<GrammarDef, HighlightError>,
    {
        let key = name.to_lowercase();
        let definition = match define(self) {
            Ok(definition) => definition,
            Err(err) if self.config.safe_mode => {
                warn!(grammar = %key, error = %err, "grammar definition failed, using plain text");
                GrammarDef::plaintext(name)
            }
            Err(err) => {
                return Err(HighlightError::DefinitionFailed {
                    name: key,
                    reason: err.to_string(),
                });
            }
        };

        for alias in &definition.aliases {
            self.aliases.insert(alias.to_lowercase(), key.clone());
        }
        if !self.grammars.contains_key(&key) {
            self.order.push(key.clone());
        }
        debug!(grammar = %key, aliases = definition.aliases.len(), "registered grammar");
        self.grammars.insert(key, Grammar::new(definition));
        Ok(())
    }

    /// Look a grammar up by name or alias, ignoring case.
    pub fn get_grammar(&self, name: &str) -> Option<&Grammar> {
        let key = name.to_lowercase();
        self.grammars.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|registered| self.grammars.get(registered))
        })
    }

    /// Like [`Highlighter::get_grammar`], for grammars that another grammar cannot do
    /// without.
    pub fn require_grammar(&self, name: &str) -> Result<&Grammar, HighlightError> {
        self.get_grammar(name)
            .ok_or_else(|| HighlightError::MissingRequiredGrammar {
                name: name.to_string(),
            })
    }

    /// Registered grammar names, in registration order.
    pub fn list_grammars(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Whether `name` is registered and eligible for auto-detection.
    pub fn auto_detection(&self, name: &str) -> bool {
        self.get_grammar(name).is_some_and(Grammar::auto_detect)
    }

    /// Highlight `code` with the grammar registered as `name`.
    ///
    /// With `ignore_illegals`, sequences a mode declares illegal are kept as text
    /// instead of stopping the parse.
    pub fn highlight(
        &self,
        name: &str,
        code: &str,
        ignore_illegals: bool,
    ) -> Result<HighlightResult, HighlightError> {
        self.highlight_with_continuation(name, code, ignore_illegals, None)
    }

    /// Highlight `code`, resuming inside the modes an earlier result ended in.
    pub fn highlight_with_continuation(
        &self,
        name: &str,
        code: &str,
        ignore_illegals: bool,
        continuation: Option<&Continuation>,
    ) -> Result<HighlightResult, HighlightError> {
        let grammar = self
            .get_grammar(name)
            .ok_or_else(|| HighlightError::UnknownGrammar {
                name: name.to_string(),
            })?;
        let compiled = grammar.compiled()?;
        highlight_compiled(self, compiled, name, code, ignore_illegals, continuation)
    }

    /// Highlight `code` with whichever grammar fits it best.
    ///
    /// Candidates are the configured `languages`, or every registered grammar.
    pub fn highlight_auto(&self, code: &str) -> Result<HighlightResult, HighlightError> {
        match &self.config.languages {
            Some(languages) => detection::detect(self, code, languages.as_slice()),
            None => detection::detect(self, code, self.order.as_slice()),
        }
    }

    /// Like [`Highlighter::highlight_auto`], restricted to `candidates`.
    pub fn highlight_auto_among<S: AsRef<str>>(
        &self,
        code: &str,
        candidates: &[S],
    ) -> Result<HighlightResult, HighlightError> {
        detection::detect(self, code, candidates)
    }
}

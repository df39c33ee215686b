//! Grammar compilation
//!
//! Turns a declarative [`crate::grammar::GrammarDef`] into a [`CompiledGrammar`]:
//!
//! 1. `regex_compose` joins many regex fragments into one alternation while keeping
//!    each fragment's back-references valid.
//! 2. `multi_regex` wraps a joined alternation and reports which fragment matched,
//!    with support for resuming after a rejected alternative.
//! 3. `compiler` walks the mode graph parent-first, resolves variants, self
//!    references and inherited end patterns, and builds a matcher per mode.

pub mod compiler;
pub mod multi_regex;
pub mod regex_compose;

pub use compiler::{compile_grammar, CompiledGrammar, CompiledMode, ModeFlags, NodeId, ROOT};
pub use multi_regex::{MultiRegex, ResumableMatcher, Rule, RuleKind, RuleMatch};
pub use regex_compose::{anchored_regex, count_capture_groups, join_patterns, lang_regex, Composed};

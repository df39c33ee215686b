//! Error taxonomy for grammar registration, compilation and highlighting
//!
//! Three layers, from innermost to outermost:
//!
//! - [`GrammarError`]: a grammar definition that cannot be compiled. Always a bug in
//!   the grammar, so it is surfaced regardless of safe mode.
//! - [`EngineFault`]: an internal safeguard tripped while scanning. Swallowed into a
//!   plain-text result in safe mode, propagated otherwise.
//! - [`HighlightError`]: what the public API returns.
//!
//! Illegal sequences are not errors at the API boundary; they are reported on
//! [`crate::HighlightResult`] instead.

use crate::grammar::ModeId;

/// Failure to compile a grammar definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// The root mode lists the self-reference marker in `contains`.
    #[error("contains `self` is not supported at the top level of a grammar")]
    SelfReferenceAtRoot,

    /// A begin, end, illegal or lexeme pattern is not a valid regular expression.
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Parent-dependent modes nest into each other without bound.
    #[error("mode nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },

    /// A `contains` or `starts` entry points outside the grammar's mode table.
    #[error("mode {id:?} is not defined in this grammar")]
    UnknownMode { id: ModeId },
}

/// An internal safeguard tripped while scanning text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineFault {
    /// Far more scan iterations than input consumed.
    #[error("potential infinite loop: {iterations} iterations at index {index}")]
    RunawayLoop { iterations: usize, index: usize },

    /// A begin and an end matched the same empty span back to back.
    #[error("zero width match at index {index}")]
    ZeroWidthMatch { index: usize },

    /// Modes opened inside each other past the depth limit.
    #[error("mode nesting exceeds {limit} levels at index {index}")]
    NestingTooDeep { limit: usize, index: usize },

    /// The regex engine gave up, e.g. on its backtracking limit.
    #[error("regex failure: {message}")]
    Regex { message: String },
}

impl From<fancy_regex::Error> for EngineFault {
    fn from(err: fancy_regex::Error) -> Self {
        EngineFault::Regex {
            message: err.to_string(),
        }
    }
}

/// Errors returned by [`crate::Highlighter`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HighlightError {
    /// Neither a grammar nor an alias is registered under this name.
    #[error("could not find the language '{name}', did you forget to register it?")]
    UnknownGrammar { name: String },

    /// A grammar definition declared a hard dependency that is not registered.
    #[error("the '{name}' language is required, but not loaded")]
    MissingRequiredGrammar { name: String },

    /// A grammar definition function itself failed (strict mode only).
    #[error("language definition for '{name}' could not be registered: {reason}")]
    DefinitionFailed { name: String, reason: String },

    #[error(transparent)]
    GrammarConfiguration(#[from] GrammarError),

    #[error(transparent)]
    InternalEngineFault(#[from] EngineFault),
}

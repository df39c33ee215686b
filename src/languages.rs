//! Bundled grammars
//!
//! A small set of grammars, enough for the command line tool to be useful and for
//! tests to exercise the engine end to end. Each module exposes a `define` function
//! with the signature [`Highlighter::register_grammar`] expects.

pub mod diff;
pub mod http;
pub mod ini;
pub mod json;

use crate::error::HighlightError;
use crate::grammar::GrammarDef;
use crate::highlighter::Highlighter;
use tracing::warn;

type DefineFn = fn(&Highlighter) -> Result<GrammarDef, HighlightError>;

/// Bundled grammars in registration order.
const BUNDLED: &[(&str, DefineFn)] = &[
    ("json", json::define),
    ("diff", diff::define),
    ("ini", ini::define),
    ("http", http::define),
];

/// Register every bundled grammar. Failures are logged and skipped.
pub fn register_all(highlighter: &mut Highlighter) {
    for &(name, define) in BUNDLED {
        if let Err(err) = highlighter.register_grammar(name, define) {
            warn!(grammar = name, error = %err, "could not register bundled grammar");
        }
    }
}

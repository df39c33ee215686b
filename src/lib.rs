//! # glint
//!
//! A syntax highlighting engine driven by declarative grammars.
//!
//! A grammar is a graph of [`grammar::Mode`]s: nested lexical rules with begin/end
//! patterns, keyword tables and embedded sub-languages. The engine compiles each
//! grammar once into combined regular expressions, scans text with a stack machine
//! and produces a [`token_tree::TokenTree`] of tagged spans. When no grammar is
//! named, every registered grammar is tried and the most relevant one wins.
//!
//! ```text
//! Highlighter::highlight(name, code)        Highlighter::highlight_auto(code)
//!            |                                         |
//!            |                              detection (one run per candidate)
//!            v                                         |
//!   compiling::compile_grammar (memoized) <------------+
//!            |
//!            v
//!   parsing::engine  --events-->  token_tree::TokenTree  -->  formats (html, json, treeviz)
//! ```

pub mod compiling;
pub mod config;
pub mod detection;
pub mod error;
pub mod formats;
pub mod grammar;
pub mod highlighter;
pub mod languages;
pub mod parsing;
pub mod token_tree;

pub use crate::config::HighlightConfig;
pub use error::{EngineFault, GrammarError, HighlightError};
pub use grammar::{GrammarDef, Keywords, Mode, ModeId, ModeRef, SubLanguage};
pub use highlighter::{Grammar, Highlighter};
pub use parsing::{Continuation, HighlightResult, IllegalContext};
pub use token_tree::{Scope, TokenNode, TokenTree, TreeVisitor};

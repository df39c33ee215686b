//! Declarative grammar model
//!
//! A grammar is pure data: a root [`Mode`] plus a table of further modes that refer
//! to each other by [`ModeId`]. References may form cycles (an object value that
//! contains objects), and a mode may nest itself through [`ModeRef::SelfRef`].
//! Nothing here knows about regex compilation; see [`crate::compiling`].

pub mod common;
pub mod definition;
pub mod keywords;
pub mod mode;

pub use definition::GrammarDef;
pub use keywords::{compile_keywords, KeywordEntry, KeywordTable, Keywords};
pub use mode::{BeginGuard, BeginMatch, GuardVerdict, Mode, ModeId, ModeRef, SubLanguage};

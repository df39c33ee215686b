//! Scanning text with a compiled grammar
//!
//! [`engine`] holds the stack machine; [`result`] the values it produces. Callers go
//! through [`crate::Highlighter`], which resolves grammar names, compiles grammars on
//! first use and hands the compiled form to the engine.

pub mod engine;
pub mod result;

pub use result::{Continuation, HighlightResult, IllegalContext, PLAINTEXT};

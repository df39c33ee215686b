//! What a highlight call hands back

use crate::compiling::NodeId;
use crate::error::EngineFault;
use crate::formats::escape_html;
use crate::token_tree::{Scope, TokenNode};
use fancy_regex::Regex;
use std::sync::Arc;

/// Name reported for text no grammar claimed.
pub const PLAINTEXT: &str = "plaintext";

/// One active mode on the engine's stack.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub node: NodeId,
    /// End pattern fixed at runtime from the begin lexeme (`end_same_as_begin`).
    pub end_override: Option<Arc<Regex>>,
}

impl Frame {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            end_override: None,
        }
    }
}

/// The mode stack as it stood when a highlight call finished.
///
/// Passing it to a later call of the same grammar resumes inside the same modes,
/// which is how an embedded language split over several regions of its host keeps
/// one running state.
#[derive(Debug, Clone)]
pub struct Continuation {
    pub(crate) frames: Vec<Frame>,
}

impl Continuation {
    /// Number of active modes, counting the root.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether only the root mode was active.
    pub fn is_at_root(&self) -> bool {
        self.frames.len() <= 1
    }
}

/// Where and why a parse hit an illegal sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalContext {
    pub message: String,
    /// Up to 100 bytes of input on either side of the scan position.
    pub context: String,
    /// Class of the mode that declared the sequence illegal.
    pub mode: Option<String>,
    /// Scan position when the sequence was found.
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct HighlightResult {
    /// Grammar that produced the result, as requested by the caller.
    pub language: String,
    pub relevance: u32,
    pub tree: Scope,
    /// Rendered HTML; the escaped input when the parse did not complete.
    pub value: String,
    /// The input text.
    pub code: String,
    pub illegal: bool,
    pub illegal_by: Option<IllegalContext>,
    /// Markup of everything highlighted before an illegal sequence stopped the parse.
    pub sofar: Option<String>,
    /// Internal fault that was swallowed in safe mode.
    pub error_raised: Option<EngineFault>,
    /// Runner-up of auto-detection.
    pub second_best: Option<Box<HighlightResult>>,
    pub top: Option<Continuation>,
}

impl HighlightResult {
    /// An unhighlighted result: the whole input as one text leaf, relevance 0.
    pub fn plaintext(language: impl Into<String>, code: &str) -> Self {
        let mut tree = Scope::default();
        if !code.is_empty() {
            tree.children.push(TokenNode::Text(code.to_string()));
        }
        Self {
            language: language.into(),
            relevance: 0,
            tree,
            value: escape_html(code),
            code: code.to_string(),
            illegal: false,
            illegal_by: None,
            sofar: None,
            error_raised: None,
            second_best: None,
            top: None,
        }
    }

    pub fn is_plaintext(&self) -> bool {
        self.language == PLAINTEXT
    }
}

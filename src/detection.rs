//! Auto-Detector
//!
//! Runs every candidate grammar over the same text, illegal sequences tolerated, and
//! keeps the one with the highest relevance. Scores are compared strictly, so when
//! two candidates tie the one listed first stays ahead. A text no candidate scores
//! on at all comes back as plain text.

use crate::error::HighlightError;
use crate::highlighter::Highlighter;
use crate::parsing::{HighlightResult, PLAINTEXT};
use tracing::debug;

/// Pick the best of `candidates` for `code`.
///
/// Names that are not registered, or whose grammar opts out of auto-detection, are
/// skipped. The runner-up, if any candidate scored above zero besides the winner, is
/// attached as `second_best`.
pub fn detect<S: AsRef<str>>(
    highlighter: &Highlighter,
    code: &str,
    candidates: &[S],
) -> Result<HighlightResult, HighlightError> {
    let mut best: Option<HighlightResult> = None;
    let mut second: Option<HighlightResult> = None;

    for name in candidates.iter().map(AsRef::as_ref) {
        if !highlighter.auto_detection(name) {
            continue;
        }
        let mut current = highlighter.highlight(name, code, true)?;
        current.language = name.to_string();

        let best_score = best.as_ref().map_or(0, |result| result.relevance);
        let second_score = second.as_ref().map_or(0, |result| result.relevance);
        if current.relevance > best_score {
            second = best.take();
            best = Some(current);
        } else if current.relevance > second_score {
            second = Some(current);
        }
    }

    let mut result = best.unwrap_or_else(|| HighlightResult::plaintext(PLAINTEXT, code));
    result.second_best = second.map(Box::new);
    debug!(
        language = %result.language,
        relevance = result.relevance,
        "auto-detected language"
    );
    Ok(result)
}

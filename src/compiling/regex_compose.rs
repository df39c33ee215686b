//! Regex Composer
//!
//! Joins independent regex fragments into one alternation. Each fragment is wrapped
//! in its own capture group, so after a match the first participating wrapper group
//! tells which fragment fired. Wrapping shifts the numbering of every capture group
//! that follows, so back-references inside each fragment are renumbered to keep
//! pointing at the group they were written against.
//!
//! ## Example
//!
//! ```text
//! Fragments:  ["(a)\1", "(b)\1"]
//! Joined:     "((a)\2)|((b)\4)"
//! Groups:     [1, 3]
//! ```
//!
//! Counting groups is a lexical scan, not a full regex parse. Character classes
//! (where parentheses are literal), escapes and non-capturing `(?...)` openers are
//! recognised so they are not mistaken for capture groups.

use crate::error::GrammarError;
use fancy_regex::Regex;
use once_cell::sync::Lazy;

/// Matches, in priority order: a whole character class, an opening parenthesis with
/// an optional `?`, a numbered back-reference, or any other escape.
static STRUCTURE_RE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"\[(?:[^\\\]]|\\.)*\]|\(\??|\\([1-9][0-9]*)|\\.").unwrap()
});

/// An alternation built by [`join_patterns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    /// Regex source of the whole alternation.
    pub source: String,
    /// Capture group index wrapping each input fragment, in input order.
    pub groups: Vec<usize>,
}

/// Join `patterns` with `separator`, wrapping each one in a capture group and
/// renumbering its back-references.
///
/// Earlier fragments keep priority over later ones when both match at the same
/// position, as regex alternation is leftmost-first.
pub fn join_patterns<S: AsRef<str>>(patterns: &[S], separator: &str) -> Composed {
    let mut captures = 0;
    let mut source = String::new();
    let mut groups = Vec::with_capacity(patterns.len());

    for (index, pattern) in patterns.iter().enumerate() {
        captures += 1;
        let offset = captures;
        groups.push(offset);

        if index > 0 {
            source.push_str(separator);
        }
        source.push('(');
        let (rewritten, inner) = rewrite_fragment(pattern.as_ref(), offset);
        source.push_str(&rewritten);
        source.push(')');
        captures += inner;
    }

    Composed { source, groups }
}

/// Number of capture groups a regex source declares.
pub fn count_capture_groups(pattern: &str) -> usize {
    rewrite_fragment(pattern, 0).1
}

/// Shift every back-reference in `pattern` by `offset` and count its capture groups.
fn rewrite_fragment(pattern: &str, offset: usize) -> (String, usize) {
    let mut out = String::with_capacity(pattern.len());
    let mut captures = 0;
    let mut rest = pattern;

    while let Some(caps) = STRUCTURE_RE.captures(rest) {
        let Some(token) = caps.get(0) else { break };
        out.push_str(&rest[..token.start()]);
        let after = &rest[token.end()..];

        match caps.get(1).map(|number| number.as_str().parse::<usize>()) {
            Some(Ok(number)) => {
                out.push('\\');
                out.push_str(&(number + offset).to_string());
            }
            _ => {
                out.push_str(token.as_str());
                match token.as_str() {
                    "(" => captures += 1,
                    "(?" if opens_named_group(after) => captures += 1,
                    _ => {}
                }
            }
        }
        rest = after;
    }
    out.push_str(rest);

    (out, captures)
}

// `(?P<name>` and `(?<name>` capture; `(?<=` and `(?<!` are lookbehinds.
fn opens_named_group(after_question_mark: &str) -> bool {
    after_question_mark.starts_with("P<")
        || (after_question_mark.starts_with('<')
            && !after_question_mark.starts_with("<=")
            && !after_question_mark.starts_with("<!"))
}

/// Compile a grammar pattern with the flags every grammar regex uses: multi-line
/// anchors, plus case folding for case-insensitive grammars.
pub fn lang_regex(source: &str, case_insensitive: bool) -> Result<Regex, GrammarError> {
    let flags = if case_insensitive { "(?mi)" } else { "(?m)" };
    Regex::new(&format!("{flags}{source}")).map_err(|err| GrammarError::InvalidPattern {
        pattern: source.to_string(),
        message: err.to_string(),
    })
}

/// Like [`lang_regex`], but the pattern only matches at the very start of the haystack.
pub fn anchored_regex(source: &str, case_insensitive: bool) -> Result<Regex, GrammarError> {
    let anchored = format!(r"\A(?:{source})");
    lang_regex(&anchored, case_insensitive).map_err(|err| match err {
        GrammarError::InvalidPattern { message, .. } => GrammarError::InvalidPattern {
            pattern: source.to_string(),
            message,
        },
        other => other,
    })
}

/// Regex source matching `literal` exactly.
pub fn escape_literal(literal: &str) -> String {
    regex::escape(literal)
}

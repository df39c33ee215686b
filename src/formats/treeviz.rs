//! Treeviz formatter for token trees
//!
//! One line per node, nesting drawn with box connectors:
//!
//! ```text
//! ⧉ json (relevance 3)
//! ├─ ◆ punctuation
//! │  └─ ◦ {
//! ├─ ◦ ↵␠␠
//! └─ ◆ attr
//!    └─ ◦ "a"
//! ```
//!
//! Icons
//!     Result: ⧉
//!     Scope: ◆
//!     Embedded language: ⊕
//!     Untagged scope: ○
//!     Text: ◦ (line breaks shown as ↵, spaces at either end as ␠)

use super::registry::{FormatError, Formatter};
use crate::parsing::HighlightResult;
use crate::token_tree::{Scope, TokenNode};

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

/// Make whitespace in a text leaf visible.
fn text_label(text: &str) -> String {
    let visible = text.replace('\n', "↵").replace('\t', "⇥");
    let leading = visible.len() - visible.trim_start_matches(' ').len();
    let trailing = visible.len() - visible.trim_end_matches(' ').len();
    if leading == visible.len() {
        return "␠".repeat(leading);
    }
    format!(
        "{}{}{}",
        "␠".repeat(leading),
        &visible[leading..visible.len() - trailing],
        "␠".repeat(trailing)
    )
}

fn scope_label(scope: &Scope) -> (&'static str, String) {
    match (&scope.kind, scope.sublanguage) {
        (Some(kind), true) => ("⊕", kind.clone()),
        (Some(kind), false) => ("◆", kind.clone()),
        (None, true) => ("⊕", "(untagged)".to_string()),
        (None, false) => ("○", String::new()),
    }
}

fn format_node(node: &TokenNode, prefix: &str, is_last: bool, output: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    match node {
        TokenNode::Text(text) => {
            output.push_str(&format!(
                "{}{} ◦ {}\n",
                prefix,
                connector,
                truncate(&text_label(text), 30)
            ));
        }
        TokenNode::Scope(scope) => {
            let (icon, label) = scope_label(scope);
            output.push_str(&format!("{}{} {} {}\n", prefix, connector, icon, label));

            let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
            format_children(scope, &child_prefix, output);
        }
    }
}

fn format_children(scope: &Scope, prefix: &str, output: &mut String) {
    let count = scope.children.len();
    for (i, child) in scope.children.iter().enumerate() {
        format_node(child, prefix, i == count - 1, output);
    }
}

pub fn to_treeviz_str(result: &HighlightResult) -> String {
    let mut output = format!("⧉ {} (relevance {})\n", result.language, result.relevance);
    format_children(&result.tree, "", &mut output);
    output
}

/// Formatter implementation for treeviz format
pub struct TreevizFormatter;

impl Formatter for TreevizFormatter {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn serialize(&self, result: &HighlightResult) -> Result<String, FormatError> {
        Ok(to_treeviz_str(result))
    }

    fn description(&self) -> &str {
        "Visual tree representation with connectors and Unicode icons"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_tree::TokenTree;

    #[test]
    fn test_treeviz() {
        let mut tree = TokenTree::new();
        tree.open_node("punctuation");
        tree.add_text("{");
        tree.close_node();
        tree.add_text("\n  ");
        tree.open_node("attr");
        tree.add_text("\"a\"");
        tree.close_node();

        let mut result = HighlightResult::plaintext("json", "{\n  \"a\"");
        result.tree = tree.finish();
        result.relevance = 3;

        insta::assert_snapshot!(to_treeviz_str(&result), @r#"
        ⧉ json (relevance 3)
        ├─ ◆ punctuation
        │  └─ ◦ {
        ├─ ◦ ↵␠␠
        └─ ◆ attr
           └─ ◦ "a"
        "#);
    }

    #[test]
    fn test_text_label() {
        assert_eq!(text_label("  a b "), "␠␠a b␠");
        assert_eq!(text_label("   "), "␠␠␠");
        assert_eq!(text_label("\tx\n"), "⇥x↵");
    }

    #[test]
    fn test_long_text_is_truncated() {
        let label = truncate(&"x".repeat(40), 30);
        assert_eq!(label, format!("{}...", "x".repeat(30)));
    }
}

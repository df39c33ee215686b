//! HTML rendering of token trees
//!
//! Every classed scope becomes `<span class="{prefix}{kind}">`. Scopes holding an
//! embedded grammar's result carry the bare grammar name instead, and scopes without
//! a kind emit no tag at all. Text is escaped, nothing else is touched.

use super::registry::{FormatError, Formatter};
use crate::config::HighlightConfig;
use crate::parsing::HighlightResult;
use crate::token_tree::{Scope, TreeVisitor};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const SPAN_CLOSE: &str = "</span>";

/// A line break, or the run of tags and tabs that starts a line.
static FIX_MARKUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\n|^(?:<[^>]+>|\t)*").unwrap());

/// Escape `&`, `<` and `>`.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

struct HtmlRenderer<'a> {
    buffer: String,
    class_prefix: &'a str,
}

impl TreeVisitor for HtmlRenderer<'_> {
    fn open(&mut self, scope: &Scope) {
        let Some(kind) = &scope.kind else {
            return;
        };
        self.buffer.push_str("<span class=\"");
        if !scope.sublanguage {
            self.buffer.push_str(self.class_prefix);
        }
        self.buffer.push_str(kind);
        self.buffer.push_str("\">");
    }

    fn text(&mut self, text: &str) {
        self.buffer.push_str(&escape_html(text));
    }

    fn close(&mut self, scope: &Scope) {
        if scope.kind.is_some() {
            self.buffer.push_str(SPAN_CLOSE);
        }
    }
}

/// Render `tree` as HTML, prefixing the class of every non-embedded scope.
pub fn render_html(tree: &Scope, class_prefix: &str) -> String {
    let mut renderer = HtmlRenderer {
        buffer: String::new(),
        class_prefix,
    };
    tree.walk(&mut renderer);
    renderer.buffer
}

/// Post-process rendered markup for display outside a `<pre>` block.
///
/// With `tab_replace`, tabs in a line's leading indentation (including tabs that
/// follow opening tags there) are replaced; with `use_br`, line breaks become `<br>`.
/// Without either option the markup is returned unchanged.
pub fn fix_markup(value: &str, config: &HighlightConfig) -> String {
    if config.tab_replace.is_none() && !config.use_br {
        return value.to_string();
    }
    FIX_MARKUP_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if config.use_br && matched == "\n" {
                "<br>".to_string()
            } else if let Some(tab) = &config.tab_replace {
                matched.replace('\t', tab)
            } else {
                matched.to_string()
            }
        })
        .into_owned()
}

/// HTML output, post-processed with [`fix_markup`].
#[derive(Debug, Clone, Default)]
pub struct HtmlFormatter {
    config: HighlightConfig,
}

impl HtmlFormatter {
    pub fn new(config: HighlightConfig) -> Self {
        Self { config }
    }
}

impl Formatter for HtmlFormatter {
    fn name(&self) -> &str {
        "html"
    }

    fn serialize(&self, result: &HighlightResult) -> Result<String, FormatError> {
        // The tree of an illegal result stops short of the input.
        let markup = if result.illegal {
            escape_html(&result.code)
        } else {
            render_html(&result.tree, &self.config.class_prefix)
        };
        Ok(fix_markup(&markup, &self.config))
    }

    fn description(&self) -> &str {
        "HTML with one <span> per classed scope"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_tree::TokenTree;
    use rstest::rstest;

    fn sample_tree() -> Scope {
        let mut tree = TokenTree::new();
        tree.open_node("attr");
        tree.add_text("\"a\"");
        tree.close_node();
        tree.add_text(": ");
        tree.add_keyword("1", "number");
        tree.add_text(" < 2 & 3");
        tree.finish()
    }

    #[rstest]
    #[case("a < b", "a &lt; b")]
    #[case("x && y > z", "x &amp;&amp; y &gt; z")]
    #[case("\"quoted\" 'single'", "\"quoted\" 'single'")]
    #[case("", "")]
    fn test_escape_html(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_html(input), expected);
    }

    #[test]
    fn test_render_html() {
        insta::assert_snapshot!(
            render_html(&sample_tree(), "hljs-"),
            @r#"<span class="hljs-attr">"a"</span>: <span class="hljs-number">1</span> &lt; 2 &amp; 3"#
        );
    }

    #[test]
    fn test_render_html_custom_prefix() {
        insta::assert_snapshot!(
            render_html(&sample_tree(), ""),
            @r#"<span class="attr">"a"</span>: <span class="number">1</span> &lt; 2 &amp; 3"#
        );
    }

    #[test]
    fn test_sublanguage_class_has_no_prefix() {
        let mut inner = TokenTree::new();
        inner.add_keyword("true", "literal");

        let mut outer = TokenTree::new();
        outer.add_sublanguage(inner.finish(), Some("json"));
        let mut untagged = TokenTree::new();
        untagged.add_text("plain");
        outer.add_sublanguage(untagged.finish(), None);

        insta::assert_snapshot!(
            render_html(&outer.finish(), "hljs-"),
            @r#"<span class="json"><span class="hljs-literal">true</span></span>plain"#
        );
    }

    #[test]
    fn test_fix_markup_without_options_is_identity() {
        let markup = "\ta\n\tb";
        assert_eq!(fix_markup(markup, &HighlightConfig::default()), markup);
    }

    #[test]
    fn test_fix_markup_use_br() {
        let config = HighlightConfig {
            use_br: true,
            ..HighlightConfig::default()
        };
        assert_eq!(fix_markup("a\n\nb\n", &config), "a<br><br>b<br>");
    }

    #[test]
    fn test_fix_markup_tab_replace_only_leading() {
        let config = HighlightConfig {
            tab_replace: Some("  ".to_string()),
            ..HighlightConfig::default()
        };
        assert_eq!(
            fix_markup("\tx\ty\n<span class=\"c\">\t\tz</span>", &config),
            "  x\ty\n<span class=\"c\">    z</span>"
        );
    }

    #[test]
    fn test_fix_markup_both_options() {
        let config = HighlightConfig {
            tab_replace: Some("    ".to_string()),
            use_br: true,
            ..HighlightConfig::default()
        };
        assert_eq!(fix_markup("a\n\tb", &config), "a<br>    b");
    }

    #[test]
    fn test_formatter_renders_illegal_result_as_escaped_input() {
        let mut result = HighlightResult::plaintext("json", "<x>");
        result.illegal = true;
        let html = HtmlFormatter::default().serialize(&result).unwrap();
        assert_eq!(html, "&lt;x&gt;");
    }
}

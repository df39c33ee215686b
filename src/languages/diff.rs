//! Unified and context diffs

use crate::error::HighlightError;
use crate::grammar::{GrammarDef, Mode};
use crate::highlighter::Highlighter;

pub fn define(_: &Highlighter) -> Result<GrammarDef, HighlightError> {
    let mut grammar = GrammarDef::new("Diff").aliases(["patch"]);

    let hunk_header = grammar.add(
        Mode::new().class_name("meta").relevance(10).variants([
            Mode::new().begin(r"^@@ +-\d+,\d+ +\+\d+,\d+ +@@$"),
            Mode::new().begin(r"^\*\*\* +\d+,\d+ +\*\*\*\*$"),
            Mode::new().begin(r"^--- +\d+,\d+ +----$"),
        ]),
    );
    let file_header = grammar.add(Mode::new().class_name("comment").variants([
        Mode::new().begin("Index: ").end("$"),
        Mode::new().begin("={3,}").end("$"),
        Mode::new().begin("^-{3}").end("$"),
        Mode::new().begin(r"^\*{3} ").end("$"),
        Mode::new().begin(r"^\+{3}").end("$"),
        Mode::new().begin(r"^\*{15}$"),
    ]));
    let addition = grammar.add(Mode::new().class_name("addition").begin(r"^\+").end("$"));
    let deletion = grammar.add(Mode::new().class_name("deletion").begin("^-").end("$"));
    let changed = grammar.add(Mode::new().class_name("addition").begin("^!").end("$"));

    Ok(grammar.root(Mode::new().contains([hunk_header, file_header, addition, deletion, changed])))
}

#[cfg(test)]
mod tests {
    use crate::Highlighter;

    #[test]
    fn test_unified_diff() {
        let highlighter = Highlighter::with_bundled_languages();
        let code = "--- a/x\n+++ b/x\n@@ -1,2 +1,2 @@\n-old\n+new\n same";
        let result = highlighter.highlight("patch", code, false).unwrap();

        assert!(!result.illegal);
        assert_eq!(result.tree.text(), code);
        insta::assert_snapshot!(result.value, @r#"
        <span class="hljs-comment">--- a/x</span>
        <span class="hljs-comment">+++ b/x</span>
        <span class="hljs-meta">@@ -1,2 +1,2 @@</span>
        <span class="hljs-deletion">-old</span>
        <span class="hljs-addition">+new</span>
         same
        "#);
    }

    #[test]
    fn test_hunk_header_is_highly_relevant() {
        let highlighter = Highlighter::with_bundled_languages();
        let result = highlighter
            .highlight("diff", "@@ -1,3 +1,4 @@", false)
            .unwrap();
        assert_eq!(result.relevance, 10);
    }
}

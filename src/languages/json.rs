//! JSON, with `//` and `/* */` comments tolerated

use crate::error::HighlightError;
use crate::grammar::{common, GrammarDef, Keywords, Mode, ModeId};
use crate::highlighter::Highlighter;

pub fn define(_: &Highlighter) -> Result<GrammarDef, HighlightError> {
    let mut grammar = GrammarDef::new("JSON");
    let literals = Keywords::classes([("literal", "true false null")]);

    let line_comment = common::c_line_comment(&mut grammar);
    let block_comment = common::c_block_comment(&mut grammar);
    let string = common::quote_string(&mut grammar);
    let number = common::c_number(&mut grammar);
    // Objects and arrays contain values, which contain objects and arrays.
    let object = grammar.reserve();
    let array = grammar.reserve();
    let values: Vec<ModeId> = vec![string, number, object, array, line_comment, block_comment];

    let value_container = Mode::new()
        .end(",")
        .ends_with_parent()
        .exclude_end()
        .contains(values.clone())
        .keywords(literals.clone());

    let escape = common::backslash_escape(&mut grammar);
    let attr = grammar.add(
        Mode::new()
            .class_name("attr")
            .begin("\"")
            .end("\"")
            .contains([escape])
            .illegal(r"\n"),
    );
    // Each parent gets its own container: the end depends on where it sits.
    let member_value = grammar.add(value_container.inherit(&Mode::new().begin(":")));
    let element = grammar.add(value_container);

    grammar.define(
        object,
        Mode::new()
            .begin(r"\{")
            .end(r"\}")
            .contains([attr, member_value, line_comment, block_comment])
            .illegal(r"\S"),
    );
    grammar.define(
        array,
        Mode::new()
            .begin(r"\[")
            .end(r"\]")
            .contains([element])
            .illegal(r"\S"),
    );

    Ok(grammar.root(
        Mode::new()
            .contains(values)
            .keywords(literals)
            .illegal(r"\S"),
    ))
}

#[cfg(test)]
mod tests {
    use crate::token_tree::{Scope, TokenNode};
    use crate::Highlighter;

    fn scope(kind: &str, text: &str) -> TokenNode {
        let mut scope = Scope::new(kind);
        scope.children.push(TokenNode::Text(text.to_string()));
        TokenNode::Scope(scope)
    }

    fn text(text: &str) -> TokenNode {
        TokenNode::Text(text.to_string())
    }

    #[test]
    fn test_object_member() {
        let highlighter = Highlighter::with_bundled_languages();
        let result = highlighter.highlight("json", r#"{"a": 1}"#, false).unwrap();

        assert!(!result.illegal);
        assert_eq!(
            result.tree.children,
            vec![
                text("{"),
                scope("attr", "\"a\""),
                text(": "),
                scope("number", "1"),
                text("}"),
            ]
        );
    }

    #[test]
    fn test_literals_in_array() {
        let highlighter = Highlighter::with_bundled_languages();
        let result = highlighter
            .highlight("json", "[true, null]", false)
            .unwrap();

        assert!(!result.illegal);
        insta::assert_snapshot!(
            result.value,
            @r#"[<span class="hljs-literal">true</span>, <span class="hljs-literal">null</span>]"#
        );
    }

    #[test]
    fn test_bare_word_is_illegal() {
        let highlighter = Highlighter::with_bundled_languages();
        let result = highlighter.highlight("json", "{oops}", false).unwrap();

        assert!(result.illegal);
        let illegal = result.illegal_by.unwrap();
        assert_eq!(illegal.index, 1);
        assert!(illegal.message.contains("\"o\""));
    }
}

//! Property-based tests over arbitrary input
//!
//! Whatever the grammar makes of the text, the leaves of the token tree must read
//! back as the input, and highlighting the same text twice must agree.

use glint::Highlighter;
use proptest::prelude::*;

/// Text with a bias towards the characters the bundled grammars care about.
fn source_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~\n\t]{0,120}",
        prop::collection::vec(
            prop_oneof![
                Just("{".to_string()),
                Just("}".to_string()),
                Just("[".to_string()),
                Just("]".to_string()),
                Just("\"".to_string()),
                Just(": ".to_string()),
                Just(", ".to_string()),
                Just("\n".to_string()),
                Just("\n\n".to_string()),
                Just("// ".to_string()),
                Just("= ".to_string()),
                Just("HTTP/1.1 ".to_string()),
                "[a-z]{1,6}",
                "[0-9]{1,4}",
            ],
            0..30,
        )
        .prop_map(|parts| parts.concat()),
        "\\PC{0,40}",
    ]
}

proptest! {
    #[test]
    fn tree_text_round_trips(code in source_strategy()) {
        let highlighter = Highlighter::with_bundled_languages();
        for name in highlighter.list_grammars() {
            let result = highlighter.highlight(name, &code, true).unwrap();
            prop_assert_eq!(result.tree.text(), code.clone(), "grammar {}", name);
            prop_assert!(!result.illegal);
        }
    }

    #[test]
    fn auto_detection_round_trips(code in source_strategy()) {
        let highlighter = Highlighter::with_bundled_languages();
        let result = highlighter.highlight_auto(&code).unwrap();
        prop_assert_eq!(result.tree.text(), code);
    }

    #[test]
    fn highlighting_is_deterministic(code in source_strategy()) {
        let highlighter = Highlighter::with_bundled_languages();
        for name in highlighter.list_grammars() {
            let first = highlighter.highlight(name, &code, false).unwrap();
            let second = highlighter.highlight(name, &code, false).unwrap();
            prop_assert_eq!(first.relevance, second.relevance);
            prop_assert_eq!(&first.value, &second.value);
            prop_assert_eq!(first.illegal, second.illegal);
        }
    }
}

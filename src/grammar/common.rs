//! Building blocks shared by many grammars
//!
//! Patterns are plain regex source strings. Modes are added to the grammar being
//! built and their ids returned, so each grammar owns its own copies.

use super::definition::GrammarDef;
use super::mode::{Mode, ModeId, ModeRef};

pub const IDENT_RE: &str = r"[a-zA-Z]\w*";
pub const UNDERSCORE_IDENT_RE: &str = r"[a-zA-Z_]\w*";
pub const NUMBER_RE: &str = r"\b\d+(\.\d+)?";
/// 0x..., 0..., decimal, float
pub const C_NUMBER_RE: &str = r"(-?)(\b0[xX][a-fA-F0-9]+|(\b\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)";
pub const BINARY_NUMBER_RE: &str = r"\b(0b[01]+)";
pub const RE_STARTERS_RE: &str = r"!|!=|!==|%|%=|&|&&|&=|\*|\*=|\+|\+=|,|-|-=|/=|/|:|;|<<|<<=|<=|<|===|==|=|>>>=|>>=|>=|>>>|>>|>|\?|\[|\{|\(|\^|\^=|\||\|=|\|\||~";

const PHRASAL_WORDS_RE: &str = r"\b(a|an|the|are|I'm|isn't|don't|doesn't|won't|but|just|should|pretty|simply|enough|gonna|going|wtf|so|such|will|you|your|they|like|more)\b";
const DOCTAG_RE: &str = r"(?:TODO|FIXME|NOTE|BUG|XXX):";
const CSS_UNITS_RE: &str =
    r"(%|em|ex|ch|rem|vw|vh|vmin|vmax|cm|mm|in|pt|pc|px|deg|grad|rad|turn|s|ms|Hz|kHz|dpi|dpcm|dppx)?";

pub fn backslash_escape(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(Mode::new().begin(r"\\[\s\S]").relevance(0))
}

pub fn apos_string(grammar: &mut GrammarDef) -> ModeId {
    let escape = backslash_escape(grammar);
    grammar.add(
        Mode::new()
            .class_name("string")
            .begin("'")
            .end("'")
            .illegal(r"\n")
            .contains([escape]),
    )
}

pub fn quote_string(grammar: &mut GrammarDef) -> ModeId {
    let escape = backslash_escape(grammar);
    grammar.add(
        Mode::new()
            .class_name("string")
            .begin("\"")
            .end("\"")
            .illegal(r"\n")
            .contains([escape]),
    )
}

/// Common English words; each one found in a comment nudges relevance up.
pub fn phrasal_words(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(Mode::new().begin(PHRASAL_WORDS_RE))
}

/// A comment mode with phrasal words and `TODO:`-style doc tags inside.
///
/// `overrides` is merged over the base comment; its `contains` (if any) is kept and
/// the two standard children are appended after it.
pub fn comment(
    grammar: &mut GrammarDef,
    begin: Option<&str>,
    end: Option<&str>,
    overrides: Mode,
) -> ModeId {
    let mut base = Mode::new().class_name("comment").contains(Vec::<ModeId>::new());
    base.begin = begin.map(str::to_string);
    base.end = end.map(str::to_string);
    let mut mode = base.inherit(&overrides);

    let phrasal = phrasal_words(grammar);
    let doctag = grammar.add(
        Mode::new()
            .class_name("doctag")
            .begin(DOCTAG_RE)
            .relevance(0),
    );
    mode.contains
        .get_or_insert_with(Vec::new)
        .extend([ModeRef::from(phrasal), ModeRef::from(doctag)]);
    grammar.add(mode)
}

pub fn c_line_comment(grammar: &mut GrammarDef) -> ModeId {
    comment(grammar, Some("//"), Some("$"), Mode::new())
}

pub fn c_block_comment(grammar: &mut GrammarDef) -> ModeId {
    comment(grammar, Some(r"/\*"), Some(r"\*/"), Mode::new())
}

pub fn hash_comment(grammar: &mut GrammarDef) -> ModeId {
    comment(grammar, Some("#"), Some("$"), Mode::new())
}

pub fn number(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(Mode::new().class_name("number").begin(NUMBER_RE).relevance(0))
}

pub fn c_number(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(Mode::new().class_name("number").begin(C_NUMBER_RE).relevance(0))
}

pub fn binary_number(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(
        Mode::new()
            .class_name("number")
            .begin(BINARY_NUMBER_RE)
            .relevance(0),
    )
}

pub fn css_number(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(
        Mode::new()
            .class_name("number")
            .begin(format!("{NUMBER_RE}{CSS_UNITS_RE}"))
            .relevance(0),
    )
}

/// A regex literal. The outer lookahead makes sure a whole `/.../` is present, so
/// `3 / x` is left alone.
pub fn regexp(grammar: &mut GrammarDef) -> ModeId {
    let escape = backslash_escape(grammar);
    let class = grammar.add(
        Mode::new()
            .begin(r"\[")
            .end(r"\]")
            .relevance(0)
            .contains([escape]),
    );
    let literal = grammar.add(
        Mode::new()
            .class_name("regexp")
            .begin("/")
            .end("/[gimuy]*")
            .illegal(r"\n")
            .contains([escape, class]),
    );
    grammar.add(Mode::new().begin(r"(?=/[^/\n]*/)").contains([literal]))
}

pub fn title(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(Mode::new().class_name("title").begin(IDENT_RE).relevance(0))
}

pub fn underscore_title(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(
        Mode::new()
            .class_name("title")
            .begin(UNDERSCORE_IDENT_RE)
            .relevance(0),
    )
}

/// Swallows `.name` so member accesses are not read as keywords.
pub fn method_guard(grammar: &mut GrammarDef) -> ModeId {
    grammar.add(
        Mode::new()
            .begin(format!(r"\.\s*{UNDERSCORE_IDENT_RE}"))
            .relevance(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_appends_standard_children() {
        let mut grammar = GrammarDef::new("Test");
        let id = c_line_comment(&mut grammar);
        let mode = grammar.mode(id).unwrap();

        assert_eq!(mode.class_name.as_deref(), Some("comment"));
        assert_eq!(mode.begin.as_deref(), Some("//"));
        let contains = mode.contains.clone().unwrap();
        assert_eq!(contains.len(), 2);
        let ModeRef::Id(doctag) = contains[1] else {
            panic!("expected the doctag mode, got {:?}", contains[1]);
        };
        let doctag = grammar.mode(doctag).unwrap();
        assert_eq!(doctag.class_name.as_deref(), Some("doctag"));
        assert_eq!(doctag.relevance, Some(0));
    }

    #[test]
    fn test_comment_keeps_override_children_first() {
        let mut grammar = GrammarDef::new("Test");
        let extra = grammar.add(Mode::new().begin("@param"));
        let id = comment(
            &mut grammar,
            Some(r"/\*\*"),
            Some(r"\*/"),
            Mode::new().contains([extra]).relevance(0),
        );
        let mode = grammar.mode(id).unwrap();

        let contains = mode.contains.as_ref().unwrap();
        assert_eq!(contains[0], ModeRef::Id(extra));
        assert_eq!(contains.len(), 3);
        assert_eq!(mode.relevance, Some(0));
    }

    #[test]
    fn test_common_patterns_compile() {
        for pattern in [
            IDENT_RE,
            UNDERSCORE_IDENT_RE,
            NUMBER_RE,
            C_NUMBER_RE,
            BINARY_NUMBER_RE,
            RE_STARTERS_RE,
            PHRASAL_WORDS_RE,
            DOCTAG_RE,
        ] {
            assert!(fancy_regex::Regex::new(pattern).is_ok(), "{pattern}");
        }
    }
}

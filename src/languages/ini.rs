//! INI files and TOML

use crate::error::HighlightError;
use crate::grammar::{common, GrammarDef, Mode, ModeRef};
use crate::highlighter::Highlighter;

pub fn define(_: &Highlighter) -> Result<GrammarDef, HighlightError> {
    let mut grammar = GrammarDef::new("TOML, also INI")
        .aliases(["toml"])
        .case_insensitive();

    let numbers = grammar.add(Mode::new().class_name("number").relevance(0).variants([
        Mode::new().begin(r"([\+\-]+)?[\d]+_[\d_]+"),
        Mode::new().begin(common::NUMBER_RE),
    ]));
    let comments = common::comment(&mut grammar, None, None, Mode::new());
    if let Some(mode) = grammar.mode_mut(comments) {
        mode.variants = Some(vec![
            Mode::new().begin(";").end("$"),
            Mode::new().begin("#").end("$"),
        ]);
    }
    let variables = grammar.add(Mode::new().class_name("variable").variants([
        Mode::new().begin(r#"\$[\w\d"][\w\d_]*"#),
        Mode::new().begin(r"\$\{(.*?)\}"),
    ]));
    let literals = grammar.add(
        Mode::new()
            .class_name("literal")
            .begin(r"\bon|off|true|false|yes|no\b"),
    );
    let escape = common::backslash_escape(&mut grammar);
    let strings = grammar.add(
        Mode::new()
            .class_name("string")
            .contains([escape])
            .variants([
                Mode::new().begin("'''").end("'''").relevance(10),
                Mode::new().begin("\"\"\"").end("\"\"\"").relevance(10),
                Mode::new().begin("\"").end("\""),
                Mode::new().begin("'").end("'"),
            ]),
    );
    let array = grammar.add(
        Mode::new()
            .begin(r"\[")
            .end(r"\]")
            .relevance(0)
            .contains([
                ModeRef::from(comments),
                literals.into(),
                variables.into(),
                strings.into(),
                numbers.into(),
                ModeRef::SelfRef,
            ]),
    );

    let section = grammar.add(Mode::new().class_name("section").begin(r"\[+").end(r"\]+"));
    let value = grammar.add(
        Mode::new()
            .end("$")
            .contains([comments, array, literals, variables, strings, numbers]),
    );
    let key = grammar.add(
        Mode::new()
            .class_name("attr")
            .begin(r"^[a-z0-9\[\]_\.-]+(?=\s*=\s*)")
            .starts(value),
    );

    Ok(grammar.root(
        Mode::new()
            .contains([comments, section, key])
            .illegal(r"\S"),
    ))
}

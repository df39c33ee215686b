//! HTTP requests and responses
//!
//! The body after the blank line is highlighted with whichever registered grammar
//! fits it best.

use crate::error::HighlightError;
use crate::grammar::{GrammarDef, Mode};
use crate::highlighter::Highlighter;

const VERSION_RE: &str = r"HTTP/[0-9\.]+";

pub fn define(_: &Highlighter) -> Result<GrammarDef, HighlightError> {
    let mut grammar = GrammarDef::new("HTTP").aliases(["https"]);

    let status_code = grammar.add(Mode::new().class_name("number").begin(r"\b\d{3}\b"));
    let status_line = grammar.add(
        Mode::new()
            .begin(format!("^{VERSION_RE}"))
            .end("$")
            .contains([status_code]),
    );

    let target = grammar.add(
        Mode::new()
            .class_name("string")
            .begin(" ")
            .end(" ")
            .exclude_begin()
            .exclude_end(),
    );
    let version = grammar.add(Mode::new().begin(VERSION_RE));
    let method = grammar.add(Mode::new().class_name("keyword").begin("[A-Z]+"));
    let request_line = grammar.add(
        Mode::new()
            .begin(format!("^[A-Z]+ (.*?) {VERSION_RE}$"))
            .return_begin()
            .end("$")
            .contains([target, version, method]),
    );

    let header_value = grammar.add(Mode::new().end("$").relevance(0));
    let header_name = grammar.add(
        Mode::new()
            .class_name("attribute")
            .begin(r"^\w")
            .end(": ")
            .exclude_end()
            .illegal(r"\n|\s|=")
            .starts(header_value),
    );

    let body_contents = grammar.add(
        Mode::new()
            .auto_sub_language(Vec::<String>::new())
            .ends_with_parent(),
    );
    let body = grammar.add(Mode::new().begin(r"\n\n").starts(body_contents));

    Ok(grammar.root(
        Mode::new()
            .contains([status_line, request_line, header_name, body])
            .illegal(r"\S"),
    ))
}

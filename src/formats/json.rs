//! JSON output: result metadata plus the token tree
//!
//! Text leaves serialize as plain strings and scopes as objects, so the tree reads
//! back in source order.

use super::registry::{FormatError, Formatter};
use crate::parsing::HighlightResult;
use serde_json::{json, Value};

pub fn to_json_value(result: &HighlightResult) -> Value {
    json!({
        "language": result.language,
        "relevance": result.relevance,
        "illegal": result.illegal,
        "second_best": result.second_best.as_ref().map(|second| second.language.as_str()),
        "tree": result.tree,
    })
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, result: &HighlightResult) -> Result<String, FormatError> {
        serde_json::to_string_pretty(&to_json_value(result))
            .map_err(|err| FormatError::SerializationError(err.to_string()))
    }

    fn description(&self) -> &str {
        "Token tree and result metadata as JSON"
    }
}

//! Keyword tables
//!
//! Raw keyword declarations are space separated word lists, optionally grouped by
//! class. A word may carry an explicit relevance with a `|` suffix (`"puts|10"`).
//! Words without one score 1, except a handful of words so common across languages
//! that they would skew auto-detection; those score 0.

use std::collections::HashMap;

/// Words that carry no relevance unless a score is given explicitly.
const COMMON_KEYWORDS: &[&str] = &["of", "and", "for", "in", "not", "or", "if", "then"];

/// Keyword declaration as written in a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keywords {
    /// A single list; every word gets the `keyword` class.
    Plain(String),
    /// Lists grouped by class, e.g. `literal => "true false null"`.
    Classes(Vec<(String, String)>),
}

impl Keywords {
    pub fn plain(words: impl Into<String>) -> Self {
        Keywords::Plain(words.into())
    }

    pub fn classes<I, K, V>(groups: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Keywords::Classes(
            groups
                .into_iter()
                .map(|(class, words)| (class.into(), words.into()))
                .collect(),
        )
    }
}

/// Class and relevance of one compiled keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    pub class_name: String,
    pub relevance: u32,
}

pub type KeywordTable = HashMap<String, KeywordEntry>;

/// Flatten a keyword declaration into a lookup table.
///
/// With `case_insensitive` the words are stored lower case; lookups must fold too.
pub fn compile_keywords(raw: &Keywords, case_insensitive: bool) -> KeywordTable {
    let mut table = KeywordTable::new();
    match raw {
        Keywords::Plain(words) => split_and_compile(&mut table, "keyword", words, case_insensitive),
        Keywords::Classes(groups) => {
            for (class_name, words) in groups {
                split_and_compile(&mut table, class_name, words, case_insensitive);
            }
        }
    }
    table
}

fn split_and_compile(table: &mut KeywordTable, class_name: &str, words: &str, fold: bool) {
    let words = if fold {
        words.to_lowercase()
    } else {
        words.to_string()
    };
    for word in words.split_whitespace() {
        let (word, score) = match word.split_once('|') {
            Some((word, score)) => (word, score.parse::<u32>().ok()),
            None => (word, None),
        };
        table.insert(
            word.to_string(),
            KeywordEntry {
                class_name: class_name.to_string(),
                relevance: score_for_keyword(word, score),
            },
        );
    }
}

// An explicit score always wins, so a common word can still be forced to count.
fn score_for_keyword(word: &str, provided: Option<u32>) -> u32 {
    match provided {
        Some(score) => score,
        _ if is_common_keyword(word) => 0,
        _ => 1,
    }
}

fn is_common_keyword(word: &str) -> bool {
    let lower = word.to_lowercase();
    COMMON_KEYWORDS.contains(&lower.as_str())
}

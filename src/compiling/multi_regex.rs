//! Combined matchers over a mode's rules
//!
//! A mode is scanned with one regex: the begin patterns of all its children, then
//! its own end pattern, then its illegal pattern, joined by [`join_patterns`]. The
//! earliest match in the text wins; among matches at the same position, the rule
//! listed first wins.
//!
//! [`ResumableMatcher`] additionally answers "what else could match here?". When the
//! engine rejects a begin match (a guard says ignore), scanning restarts at the same
//! cursor but only over the rules after the rejected one. The sub-matchers for those
//! suffixes are built on first use and cached; most modes never need more than the
//! full one.

use super::regex_compose::{join_patterns, lang_regex};
use crate::error::{EngineFault, GrammarError};
use fancy_regex::Regex;
use once_cell::sync::OnceCell;

/// What a rule means when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// A child mode starts; carries the child's node id.
    Begin(usize),
    /// The current mode (or an ancestor it ends with) ends.
    End,
    /// The current mode hit a sequence that must never appear in it.
    Illegal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
        }
    }
}

/// A successful scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    /// Byte range of the matched lexeme.
    pub start: usize,
    pub end: usize,
    pub kind: RuleKind,
    /// Index of the rule that fired within the full rule list.
    pub position: usize,
}

impl RuleMatch {
    pub fn lexeme<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One alternation over a contiguous run of rules.
#[derive(Debug)]
pub struct MultiRegex {
    regex: Option<Regex>,
    /// (wrapper capture group, absolute rule index)
    groups: Vec<(usize, usize)>,
    kinds: Vec<RuleKind>,
}

impl MultiRegex {
    /// Build a matcher for `rules`, numbering them from `first_position`.
    pub fn new(
        rules: &[Rule],
        first_position: usize,
        case_insensitive: bool,
    ) -> Result<Self, GrammarError> {
        if rules.is_empty() {
            return Ok(Self {
                regex: None,
                groups: Vec::new(),
                kinds: Vec::new(),
            });
        }
        let patterns: Vec<&str> = rules.iter().map(|rule| rule.pattern.as_str()).collect();
        let composed = join_patterns(&patterns, "|");
        let regex = lang_regex(&composed.source, case_insensitive)?;
        let groups = composed
            .groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| (group, first_position + index))
            .collect();

        Ok(Self {
            regex: Some(regex),
            groups,
            kinds: rules.iter().map(|rule| rule.kind).collect(),
        })
    }

    /// Find the first match at or after byte offset `from`.
    pub fn exec(&self, text: &str, from: usize) -> Result<Option<RuleMatch>, EngineFault> {
        let Some(regex) = &self.regex else {
            return Ok(None);
        };
        let Some(caps) = regex.captures_from_pos(text, from)? else {
            return Ok(None);
        };
        let Some(whole) = caps.get(0) else {
            return Ok(None);
        };
        let fired = self
            .groups
            .iter()
            .enumerate()
            .find(|(_, (group, _))| caps.get(*group).is_some());

        Ok(fired.map(|(local, &(_, position))| RuleMatch {
            start: whole.start(),
            end: whole.end(),
            kind: self.kinds[local],
            position,
        }))
    }
}

/// All rules of one mode, with lazily built matchers for every suffix of the list.
#[derive(Debug)]
pub struct ResumableMatcher {
    rules: Vec<Rule>,
    begin_count: usize,
    case_insensitive: bool,
    matchers: Vec<OnceCell<MultiRegex>>,
}

impl ResumableMatcher {
    /// Build the matcher. The full alternation is compiled right away so a broken
    /// pattern is reported at grammar compile time.
    pub fn new(rules: Vec<Rule>, case_insensitive: bool) -> Result<Self, GrammarError> {
        let begin_count = rules
            .iter()
            .filter(|rule| matches!(rule.kind, RuleKind::Begin(_)))
            .count();
        let matchers: Vec<OnceCell<MultiRegex>> =
            (0..=rules.len()).map(|_| OnceCell::new()).collect();
        let full = MultiRegex::new(&rules, 0, case_insensitive)?;
        // the cell was created just above, so it is empty
        let _ = matchers[0].set(full);

        Ok(Self {
            rules,
            begin_count,
            case_insensitive,
            matchers,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn begin_count(&self) -> usize {
        self.begin_count
    }

    /// Scan from byte offset `from`, considering only rules at index `start_at` and later.
    pub fn exec(
        &self,
        text: &str,
        from: usize,
        start_at: usize,
    ) -> Result<Option<RuleMatch>, EngineFault> {
        let Some(cell) = self.matchers.get(start_at) else {
            return Ok(None);
        };
        let matcher = cell.get_or_try_init(|| {
            MultiRegex::new(&self.rules[start_at..], start_at, self.case_insensitive).map_err(
                |err| EngineFault::Regex {
                    message: err.to_string(),
                },
            )
        })?;
        matcher.exec(text, from)
    }

    /// Where to resume after the rule at `position` fired but was rejected.
    ///
    /// Wraps to 0 once every begin rule has been tried, which tells the engine that
    /// nothing else can match at this cursor.
    pub fn resume_after(&self, position: usize) -> usize {
        let next = position + 1;
        if next == self.begin_count {
            0
        } else {
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<Rule> {
        vec![
            Rule::new("ab", RuleKind::Begin(1)),
            Rule::new("a", RuleKind::Begin(2)),
            Rule::new(";", RuleKind::End),
            Rule::new(r"\n", RuleKind::Illegal),
        ]
    }

    #[test]
    fn test_earlier_rule_wins_at_same_position() {
        let matcher = MultiRegex::new(&rules(), 0, false).unwrap();
        let found = matcher.exec("xxab", 0).unwrap().unwrap();
        assert_eq!((found.start, found.end), (2, 4));
        assert_eq!(found.kind, RuleKind::Begin(1));
        assert_eq!(found.position, 0);
    }

    #[test]
    fn test_earliest_position_wins() {
        let matcher = MultiRegex::new(&rules(), 0, false).unwrap();
        let found = matcher.exec("x;ab", 0).unwrap().unwrap();
        assert_eq!(found.kind, RuleKind::End);
        assert_eq!(found.position, 2);
    }

    #[test]
    fn test_exec_from_offset() {
        let matcher = MultiRegex::new(&rules(), 0, false).unwrap();
        let found = matcher.exec("ab\nab", 1).unwrap().unwrap();
        assert_eq!(found.kind, RuleKind::Illegal);
        assert_eq!(found.start, 2);
    }

    #[test]
    fn test_rules_with_inner_groups_map_correctly() {
        let rules = vec![
            Rule::new("(x)(y)", RuleKind::Begin(7)),
            Rule::new(r"(z)\1", RuleKind::Begin(8)),
        ];
        let matcher = MultiRegex::new(&rules, 0, false).unwrap();
        let found = matcher.exec("..zz", 0).unwrap().unwrap();
        assert_eq!(found.kind, RuleKind::Begin(8));
        assert_eq!(found.lexeme("..zz"), "zz");
    }

    #[test]
    fn test_empty_rule_list_never_matches() {
        let matcher = MultiRegex::new(&[], 0, false).unwrap();
        assert!(matcher.exec("anything", 0).unwrap().is_none());
    }

    #[test]
    fn test_resumable_skips_rejected_rules() {
        let matcher = ResumableMatcher::new(rules(), false).unwrap();
        let first = matcher.exec("ab", 0, 0).unwrap().unwrap();
        assert_eq!(first.kind, RuleKind::Begin(1));

        let resume = matcher.resume_after(first.position);
        assert_eq!(resume, 1);
        let second = matcher.exec("ab", 0, resume).unwrap().unwrap();
        assert_eq!(second.kind, RuleKind::Begin(2));
        assert_eq!(second.position, 1);
    }

    #[test]
    fn test_resume_wraps_after_last_begin() {
        let matcher = ResumableMatcher::new(rules(), false).unwrap();
        assert_eq!(matcher.begin_count(), 2);
        assert_eq!(matcher.resume_after(1), 0);
    }

    #[test]
    fn test_broken_pattern_fails_at_construction() {
        let result = ResumableMatcher::new(vec![Rule::new("(", RuleKind::End)], false);
        assert!(result.is_err());
    }
}

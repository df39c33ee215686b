//! Mode: one lexical rule of a grammar
//!
//! Every field is optional so that modes can be merged: [`Mode::inherit`] layers one
//! mode's explicitly set fields over another's. Variants use the same merge, which is
//! how a mode with `variants` expands into several sibling modes at compile time.

use super::keywords::Keywords;

/// Index of a mode inside its [`super::GrammarDef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub(crate) usize);

impl ModeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An entry of a mode's `contains` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeRef {
    /// Another mode of the same grammar.
    Id(ModeId),
    /// The containing mode itself, allowing recursive nesting.
    SelfRef,
}

impl From<ModeId> for ModeRef {
    fn from(id: ModeId) -> Self {
        ModeRef::Id(id)
    }
}

/// A begin match offered to a [`BeginGuard`] before its mode is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeginMatch<'t> {
    /// The whole text being highlighted.
    pub text: &'t str,
    pub start: usize,
    pub end: usize,
}

impl<'t> BeginMatch<'t> {
    pub fn lexeme(&self) -> &'t str {
        &self.text[self.start..self.end]
    }

    /// The character right before the match, if any.
    pub fn before(&self) -> Option<char> {
        self.text[..self.start].chars().next_back()
    }

    /// The character right after the match, if any.
    pub fn after(&self) -> Option<char> {
        self.text[self.end..].chars().next()
    }
}

/// What to do with a begin match a guard looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Enter the mode.
    Accept,
    /// Pretend the rule never matched and try the remaining rules at the same spot.
    Ignore,
    /// Do not enter the mode; keep the lexeme as text of the current mode and move on.
    Abort,
}

/// Check run on a begin match before its mode is entered.
#[derive(Debug, Clone, Copy)]
pub enum BeginGuard {
    /// Ignore matches touching a `.` on either side, so `obj.class` is not a keyword.
    NoSurroundingDot,
    Custom(fn(&BeginMatch<'_>) -> GuardVerdict),
}

/// Guards compare by variant only; any two custom guards are equal.
impl PartialEq for BeginGuard {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Eq for BeginGuard {}

impl BeginGuard {
    pub fn check(&self, candidate: &BeginMatch<'_>) -> GuardVerdict {
        match self {
            BeginGuard::NoSurroundingDot => {
                if candidate.before() == Some('.') || candidate.after() == Some('.') {
                    GuardVerdict::Ignore
                } else {
                    GuardVerdict::Accept
                }
            }
            BeginGuard::Custom(check) => check(candidate),
        }
    }
}

/// Grammar used to highlight the text collected inside a mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubLanguage {
    /// One specific grammar, by name or alias.
    Named(String),
    /// Auto-detect among these grammars; empty means all eligible grammars.
    Auto(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mode {
    /// Tag emitted while the mode is active; `None` makes the mode transparent.
    pub class_name: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    /// Space separated words that open the mode. Replaces `begin`.
    pub begin_keywords: Option<String>,
    pub illegal: Option<String>,
    pub keywords: Option<Keywords>,
    /// Pattern splitting the mode's text into keyword candidates (default `\w+`).
    pub lexemes: Option<String>,
    pub contains: Option<Vec<ModeRef>>,
    pub variants: Option<Vec<Mode>>,
    /// Mode pushed right after this one closes.
    pub starts: Option<ModeId>,
    pub sub_language: Option<SubLanguage>,
    pub relevance: Option<u32>,
    pub ends_with_parent: Option<bool>,
    pub ends_parent: Option<bool>,
    pub end_same_as_begin: Option<bool>,
    pub exclude_begin: Option<bool>,
    pub exclude_end: Option<bool>,
    pub return_begin: Option<bool>,
    pub return_end: Option<bool>,
    pub skip: Option<bool>,
    /// Checked on every begin match; `begin_keywords` installs [`BeginGuard::NoSurroundingDot`].
    pub begin_guard: Option<BeginGuard>,
}

impl Mode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `overrides` over `self`: every field set on `overrides` wins.
    ///
    /// `variants` is never inherited, so a variant expanded from a mode does not
    /// expand again.
    pub fn inherit(&self, overrides: &Mode) -> Mode {
        Mode {
            class_name: overrides.class_name.clone().or_else(|| self.class_name.clone()),
            begin: overrides.begin.clone().or_else(|| self.begin.clone()),
            end: overrides.end.clone().or_else(|| self.end.clone()),
            begin_keywords: overrides
                .begin_keywords
                .clone()
                .or_else(|| self.begin_keywords.clone()),
            illegal: overrides.illegal.clone().or_else(|| self.illegal.clone()),
            keywords: overrides.keywords.clone().or_else(|| self.keywords.clone()),
            lexemes: overrides.lexemes.clone().or_else(|| self.lexemes.clone()),
            contains: overrides.contains.clone().or_else(|| self.contains.clone()),
            variants: None,
            starts: overrides.starts.or(self.starts),
            sub_language: overrides
                .sub_language
                .clone()
                .or_else(|| self.sub_language.clone()),
            relevance: overrides.relevance.or(self.relevance),
            ends_with_parent: overrides.ends_with_parent.or(self.ends_with_parent),
            ends_parent: overrides.ends_parent.or(self.ends_parent),
            end_same_as_begin: overrides.end_same_as_begin.or(self.end_same_as_begin),
            exclude_begin: overrides.exclude_begin.or(self.exclude_begin),
            exclude_end: overrides.exclude_end.or(self.exclude_end),
            return_begin: overrides.return_begin.or(self.return_begin),
            return_end: overrides.return_end.or(self.return_end),
            skip: overrides.skip.or(self.skip),
            begin_guard: overrides.begin_guard.or(self.begin_guard),
        }
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn begin(mut self, pattern: impl Into<String>) -> Self {
        self.begin = Some(pattern.into());
        self
    }

    pub fn end(mut self, pattern: impl Into<String>) -> Self {
        self.end = Some(pattern.into());
        self
    }

    pub fn begin_keywords(mut self, words: impl Into<String>) -> Self {
        self.begin_keywords = Some(words.into());
        self
    }

    pub fn illegal(mut self, pattern: impl Into<String>) -> Self {
        self.illegal = Some(pattern.into());
        self
    }

    pub fn keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn lexemes(mut self, pattern: impl Into<String>) -> Self {
        self.lexemes = Some(pattern.into());
        self
    }

    pub fn contains<I, R>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ModeRef>,
    {
        self.contains = Some(modes.into_iter().map(Into::into).collect());
        self
    }

    pub fn variants(mut self, variants: impl IntoIterator<Item = Mode>) -> Self {
        self.variants = Some(variants.into_iter().collect());
        self
    }

    pub fn starts(mut self, mode: ModeId) -> Self {
        self.starts = Some(mode);
        self
    }

    pub fn sub_language(mut self, name: impl Into<String>) -> Self {
        self.sub_language = Some(SubLanguage::Named(name.into()));
        self
    }

    /// Auto-detect the contents among `candidates`; an empty list means all grammars.
    pub fn auto_sub_language<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_language = Some(SubLanguage::Auto(
            candidates.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn ends_with_parent(mut self) -> Self {
        self.ends_with_parent = Some(true);
        self
    }

    pub fn ends_parent(mut self) -> Self {
        self.ends_parent = Some(true);
        self
    }

    pub fn end_same_as_begin(mut self) -> Self {
        self.end_same_as_begin = Some(true);
        self
    }

    pub fn exclude_begin(mut self) -> Self {
        self.exclude_begin = Some(true);
        self
    }

    pub fn exclude_end(mut self) -> Self {
        self.exclude_end = Some(true);
        self
    }

    pub fn return_begin(mut self) -> Self {
        self.return_begin = Some(true);
        self
    }

    pub fn return_end(mut self) -> Self {
        self.return_end = Some(true);
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = Some(true);
        self
    }

    pub fn begin_guard(mut self, guard: BeginGuard) -> Self {
        self.begin_guard = Some(guard);
        self
    }

    pub fn is_ends_with_parent(&self) -> bool {
        self.ends_with_parent.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherit_overrides_set_fields_only() {
        let base = Mode::new()
            .class_name("string")
            .begin("'")
            .end("'")
            .relevance(0);
        let merged = base.inherit(&Mode::new().begin("\"").end("\""));

        assert_eq!(merged.class_name.as_deref(), Some("string"));
        assert_eq!(merged.begin.as_deref(), Some("\""));
        assert_eq!(merged.end.as_deref(), Some("\""));
        assert_eq!(merged.relevance, Some(0));
    }

    #[test]
    fn test_guards_compare_by_variant() {
        fn accept(_: &BeginMatch<'_>) -> GuardVerdict {
            GuardVerdict::Accept
        }
        fn ignore(_: &BeginMatch<'_>) -> GuardVerdict {
            GuardVerdict::Ignore
        }

        assert_eq!(BeginGuard::Custom(accept), BeginGuard::Custom(ignore));
        assert_ne!(BeginGuard::Custom(accept), BeginGuard::NoSurroundingDot);
        assert_eq!(
            Mode::new().begin_keywords("class"),
            Mode::new().begin_keywords("class")
        );
    }

    #[test]
    fn test_inherit_drops_variants() {
        let base = Mode::new().variants([Mode::new().begin("a"), Mode::new().begin("b")]);
        let merged = base.inherit(&Mode::new());
        assert!(merged.variants.is_none());
    }

    #[test]
    fn test_inherit_keeps_zero_relevance_override() {
        let base = Mode::new().relevance(10);
        let merged = base.inherit(&Mode::new().relevance(0));
        assert_eq!(merged.relevance, Some(0));
    }

    #[test]
    fn test_dot_guard() {
        let text = "obj.class class";
        let guard = BeginGuard::NoSurroundingDot;
        let member = BeginMatch { text, start: 4, end: 9 };
        let keyword = BeginMatch { text, start: 10, end: 15 };

        assert_eq!(member.lexeme(), "class");
        assert_eq!(guard.check(&member), GuardVerdict::Ignore);
        assert_eq!(guard.check(&keyword), GuardVerdict::Accept);
    }

    #[test]
    fn test_custom_guard() {
        fn reject_uppercase(candidate: &BeginMatch<'_>) -> GuardVerdict {
            if candidate.lexeme().chars().all(char::is_uppercase) {
                GuardVerdict::Abort
            } else {
                GuardVerdict::Accept
            }
        }
        let guard = BeginGuard::Custom(reject_uppercase);
        let text = "AB";
        assert_eq!(
            guard.check(&BeginMatch { text, start: 0, end: 2 }),
            GuardVerdict::Abort
        );
    }

    #[test]
    fn test_contains_accepts_ids_and_self() {
        let mode = Mode::new().contains([ModeRef::Id(ModeId(3)), ModeRef::SelfRef]);
        assert_eq!(
            mode.contains,
            Some(vec![ModeRef::Id(ModeId(3)), ModeRef::SelfRef])
        );
    }
}

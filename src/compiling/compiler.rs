//! Grammar Compiler
//!
//! Walks a [`GrammarDef`] from its root, parent before children, and produces a flat
//! table of [`CompiledMode`] nodes addressed by [`NodeId`]. The root is always node
//! [`ROOT`].
//!
//! A table mode becomes one node no matter how many parents list it, unless its end
//! depends on the parent (it ends with its parent, or its `starts` continuation
//! does). Such a mode gets one node per parent, since the parent's end pattern is
//! baked into its terminator. Variants are expanded into one node per variant with
//! the same sharing rule.
//!
//! Compilation runs in two passes. The first pass resolves the mode graph into
//! drafts, which can refer to each other in cycles. The second pass builds each
//! node's matcher, which needs the begin pattern of every child and is therefore only
//! possible once all drafts exist.

use super::multi_regex::{ResumableMatcher, Rule, RuleKind};
use super::regex_compose::{anchored_regex, lang_regex};
use crate::error::GrammarError;
use crate::grammar::{
    compile_keywords, BeginGuard, GrammarDef, KeywordTable, Keywords, Mode, ModeId, ModeRef,
    SubLanguage,
};
use fancy_regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Index of a node in [`CompiledGrammar::nodes`].
pub type NodeId = usize;

/// The grammar's top-level mode.
pub const ROOT: NodeId = 0;

/// How deep parent-dependent modes may nest before compilation gives up.
pub const MAX_NESTING: usize = 256;

/// Matches anywhere, with zero width. Used where a mode has no begin or end.
const ZERO_WIDTH_RE: &str = r"\B|\b";

const DEFAULT_LEXEMES_RE: &str = r"\w+";

/// Boolean mode settings, resolved to their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    pub ends_with_parent: bool,
    pub ends_parent: bool,
    pub end_same_as_begin: bool,
    pub exclude_begin: bool,
    pub exclude_end: bool,
    pub return_begin: bool,
    pub return_end: bool,
    pub skip: bool,
}

impl ModeFlags {
    fn of(mode: &Mode) -> Self {
        Self {
            ends_with_parent: mode.ends_with_parent.unwrap_or(false),
            ends_parent: mode.ends_parent.unwrap_or(false),
            end_same_as_begin: mode.end_same_as_begin.unwrap_or(false),
            exclude_begin: mode.exclude_begin.unwrap_or(false),
            exclude_end: mode.exclude_end.unwrap_or(false),
            return_begin: mode.return_begin.unwrap_or(false),
            return_end: mode.return_end.unwrap_or(false),
            skip: mode.skip.unwrap_or(false),
        }
    }
}

/// One mode, ready to drive the engine.
#[derive(Debug)]
pub struct CompiledMode {
    pub class_name: Option<String>,
    /// Begin pattern source; `None` for the root.
    pub begin: Option<String>,
    /// End pattern anchored at the start of the haystack.
    pub end_re: Option<Regex>,
    pub keywords: Option<KeywordTable>,
    pub lexemes_re: Regex,
    pub relevance: u32,
    pub flags: ModeFlags,
    pub sub_language: Option<SubLanguage>,
    pub begin_guard: Option<BeginGuard>,
    /// Node pushed when this one closes.
    pub starts: Option<NodeId>,
    /// Child begins, then own end (with inherited parent ends), then illegal.
    pub matcher: ResumableMatcher,
}

#[derive(Debug)]
pub struct CompiledGrammar {
    pub name: String,
    pub case_insensitive: bool,
    pub nodes: Vec<CompiledMode>,
}

impl CompiledGrammar {
    pub fn root(&self) -> &CompiledMode {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&CompiledMode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Compile a grammar definition.
pub fn compile_grammar(def: &GrammarDef) -> Result<CompiledGrammar, GrammarError> {
    let mut compiler = Compiler::new(def);
    compiler.compile(Origin::Root, def.root.clone(), None, 0)?;
    let nodes = compiler.finish()?;
    debug!(grammar = %def.name, nodes = nodes.len(), "compiled grammar");

    Ok(CompiledGrammar {
        name: def.name.clone(),
        case_insensitive: def.case_insensitive,
        nodes,
    })
}

/// Where a node's mode came from, for sharing compiled nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Origin {
    Root,
    Table(ModeId),
    Variant(ModeId, usize),
}

#[derive(Debug)]
struct Draft {
    mode: Mode,
    begin: Option<String>,
    end: Option<String>,
    terminator_end: String,
    keywords: Option<Keywords>,
    children: Vec<NodeId>,
    starts: Option<NodeId>,
}

struct Compiler<'g> {
    def: &'g GrammarDef,
    dependencies: Vec<bool>,
    drafts: Vec<Draft>,
    memo: HashMap<(Origin, Option<NodeId>), NodeId>,
}

impl<'g> Compiler<'g> {
    fn new(def: &'g GrammarDef) -> Self {
        Self {
            def,
            dependencies: def.parent_dependencies(),
            drafts: Vec::new(),
            memo: HashMap::new(),
        }
    }

    fn depends_on_parent(&self, origin: Origin, mode: &Mode) -> bool {
        match origin {
            Origin::Root => false,
            Origin::Table(id) => self.dependencies.get(id.index()).copied().unwrap_or(false),
            Origin::Variant(..) => self.def.depends_on_parent(mode),
        }
    }

    fn table_mode(&self, id: ModeId) -> Result<&'g Mode, GrammarError> {
        self.def.mode(id).ok_or(GrammarError::UnknownMode { id })
    }

    fn compile(
        &mut self,
        origin: Origin,
        mode: Mode,
        parent: Option<NodeId>,
        depth: usize,
    ) -> Result<NodeId, GrammarError> {
        let key_parent = if self.depends_on_parent(origin, &mode) {
            parent
        } else {
            None
        };
        if let Some(&id) = self.memo.get(&(origin, key_parent)) {
            return Ok(id);
        }
        if depth > MAX_NESTING {
            return Err(GrammarError::NestingTooDeep { limit: MAX_NESTING });
        }

        let id = self.drafts.len();
        self.memo.insert((origin, key_parent), id);

        let mut draft = Draft {
            mode,
            begin: None,
            end: None,
            terminator_end: String::new(),
            keywords: None,
            children: Vec::new(),
            starts: None,
        };

        if let Some(parent) = parent {
            let mode = &mut draft.mode;
            if let Some(words) = &mode.begin_keywords {
                draft.begin = Some(begin_keywords_pattern(words));
                if mode.begin_guard.is_none() {
                    mode.begin_guard = Some(BeginGuard::NoSurroundingDot);
                }
            } else {
                draft.begin = Some(mode.begin.clone().unwrap_or_else(|| ZERO_WIDTH_RE.to_string()));
            }

            draft.end = if mode.end_same_as_begin.unwrap_or(false) {
                draft.begin.clone()
            } else {
                mode.end.clone()
            };
            if draft.end.is_none() && !mode.is_ends_with_parent() {
                draft.end = Some(ZERO_WIDTH_RE.to_string());
            }

            draft.terminator_end = draft.end.clone().unwrap_or_default();
            let parent_terminator = &self.drafts[parent].terminator_end;
            if mode.is_ends_with_parent() && !parent_terminator.is_empty() {
                if draft.end.is_some() {
                    draft.terminator_end.push('|');
                }
                draft.terminator_end.push_str(parent_terminator);
            }
        }

        draft.keywords = draft.mode.keywords.clone().or_else(|| {
            draft
                .mode
                .begin_keywords
                .as_ref()
                .map(|words| Keywords::plain(words.clone()))
        });

        let contains = draft.mode.contains.clone().unwrap_or_default();
        let starts = draft.mode.starts;
        self.drafts.push(draft);

        if parent.is_none() && contains.contains(&ModeRef::SelfRef) {
            return Err(GrammarError::SelfReferenceAtRoot);
        }

        let mut children = Vec::with_capacity(contains.len());
        for entry in contains {
            match entry {
                ModeRef::SelfRef => children.push(id),
                ModeRef::Id(child) => {
                    let child_mode = self.table_mode(child)?;
                    match &child_mode.variants {
                        Some(variants) => {
                            for (index, variant) in variants.iter().enumerate() {
                                let merged = child_mode.inherit(variant);
                                let node = self.compile(
                                    Origin::Variant(child, index),
                                    merged,
                                    Some(id),
                                    depth + 1,
                                )?;
                                children.push(node);
                            }
                        }
                        None => {
                            let node = self.compile(
                                Origin::Table(child),
                                child_mode.clone(),
                                Some(id),
                                depth + 1,
                            )?;
                            children.push(node);
                        }
                    }
                }
            }
        }
        self.drafts[id].children = children;

        // a continuation replaces the mode under the same parent
        if let (Some(next), Some(_)) = (starts, parent) {
            let next_mode = self.table_mode(next)?.clone();
            let node = self.compile(Origin::Table(next), next_mode, parent, depth + 1)?;
            self.drafts[id].starts = Some(node);
        }

        Ok(id)
    }

    fn finish(self) -> Result<Vec<CompiledMode>, GrammarError> {
        let case_insensitive = self.def.case_insensitive;
        let drafts = &self.drafts;
        let mut nodes = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let mut rules = Vec::with_capacity(draft.children.len() + 2);
            for &child in &draft.children {
                let pattern = drafts[child].begin.clone().unwrap_or_default();
                rules.push(Rule::new(pattern, RuleKind::Begin(child)));
            }
            if !draft.terminator_end.is_empty() {
                rules.push(Rule::new(draft.terminator_end.clone(), RuleKind::End));
            }
            if let Some(illegal) = &draft.mode.illegal {
                rules.push(Rule::new(illegal.clone(), RuleKind::Illegal));
            }

            let end_re = draft
                .end
                .as_deref()
                .map(|end| anchored_regex(end, case_insensitive))
                .transpose()?;
            let lexemes = draft.mode.lexemes.as_deref().unwrap_or(DEFAULT_LEXEMES_RE);

            nodes.push(CompiledMode {
                class_name: draft.mode.class_name.clone(),
                begin: draft.begin.clone(),
                end_re,
                keywords: draft
                    .keywords
                    .as_ref()
                    .map(|raw| compile_keywords(raw, case_insensitive)),
                lexemes_re: lang_regex(lexemes, case_insensitive)?,
                relevance: draft.mode.relevance.unwrap_or(1),
                flags: ModeFlags::of(&draft.mode),
                sub_language: draft.mode.sub_language.clone(),
                begin_guard: draft.mode.begin_guard,
                starts: draft.starts,
                matcher: ResumableMatcher::new(rules, case_insensitive)?,
            });
        }

        Ok(nodes)
    }
}

/// `\b(w1|w2)(?=\b|\s)`, with any `|N` relevance suffix removed from the words.
fn begin_keywords_pattern(words: &str) -> String {
    let alternation = words
        .split_whitespace()
        .map(|word| word.split('|').next().unwrap_or(word))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"\b({alternation})(?=\b|\s)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::common;

    fn begins(grammar: &CompiledGrammar, id: NodeId) -> Vec<RuleKind> {
        grammar.nodes[id]
            .matcher
            .rules()
            .iter()
            .map(|rule| rule.kind)
            .collect()
    }

    #[test]
    fn test_root_has_no_end_rule() {
        let mut def = GrammarDef::new("Test");
        let string = common::quote_string(&mut def);
        def.root = Mode::new().contains([string]).illegal(r"\S");
        let compiled = compile_grammar(&def).unwrap();

        assert_eq!(compiled.root().begin, None);
        let kinds = begins(&compiled, ROOT);
        assert_eq!(kinds, vec![RuleKind::Begin(1), RuleKind::Illegal]);
    }

    #[test]
    fn test_missing_begin_and_end_default_to_zero_width() {
        let mut def = GrammarDef::new("Test");
        let group = def.add(Mode::new());
        def.root = Mode::new().contains([group]);
        let compiled = compile_grammar(&def).unwrap();

        let node = &compiled.nodes[1];
        assert_eq!(node.begin.as_deref(), Some(ZERO_WIDTH_RE));
        assert!(node.end_re.is_some());
        assert_eq!(node.relevance, 1);
    }

    #[test]
    fn test_begin_keywords() {
        let mut def = GrammarDef::new("Test");
        let class = def.add(Mode::new().begin_keywords("class struct|5").end(r"\{"));
        def.root = Mode::new().contains([class]);
        let compiled = compile_grammar(&def).unwrap();

        let node = &compiled.nodes[1];
        assert_eq!(node.begin.as_deref(), Some(r"\b(class|struct)(?=\b|\s)"));
        assert_eq!(node.begin_guard, Some(BeginGuard::NoSurroundingDot));
        let keywords = node.keywords.as_ref().unwrap();
        assert_eq!(keywords["struct"].relevance, 5);
    }

    #[test]
    fn test_self_reference_at_root_is_rejected() {
        let mut def = GrammarDef::new("Test");
        def.root = Mode::new().contains([ModeRef::SelfRef]);
        assert_eq!(
            compile_grammar(&def).unwrap_err(),
            GrammarError::SelfReferenceAtRoot
        );
    }

    #[test]
    fn test_self_reference_nests_same_node() {
        let mut def = GrammarDef::new("Test");
        let parens = def.add(
            Mode::new()
                .begin(r"\(")
                .end(r"\)")
                .contains([ModeRef::SelfRef]),
        );
        def.root = Mode::new().contains([parens]);
        let compiled = compile_grammar(&def).unwrap();

        assert_eq!(compiled.len(), 2);
        assert_eq!(begins(&compiled, 1)[0], RuleKind::Begin(1));
    }

    #[test]
    fn test_variants_expand_to_siblings() {
        let mut def = GrammarDef::new("Test");
        let string = def.add(
            Mode::new()
                .class_name("string")
                .variants([Mode::new().begin("'").end("'"), Mode::new().begin("\"").end("\"")]),
        );
        def.root = Mode::new().contains([string]);
        let compiled = compile_grammar(&def).unwrap();

        assert_eq!(compiled.len(), 3);
        assert_eq!(compiled.nodes[1].begin.as_deref(), Some("'"));
        assert_eq!(compiled.nodes[2].begin.as_deref(), Some("\""));
        assert_eq!(compiled.nodes[2].class_name.as_deref(), Some("string"));
    }

    #[test]
    fn test_ends_with_parent_joins_parent_terminator() {
        let mut def = GrammarDef::new("Test");
        let value = def.add(Mode::new().begin(":").end(",").ends_with_parent());
        let object = def.add(Mode::new().begin(r"\{").end(r"\}").contains([value]));
        def.root = Mode::new().contains([object]);
        let compiled = compile_grammar(&def).unwrap();

        let end_rule = compiled.nodes[2]
            .matcher
            .rules()
            .iter()
            .find(|rule| rule.kind == RuleKind::End)
            .unwrap();
        assert_eq!(end_rule.pattern, r",|\}");
    }

    #[test]
    fn test_parent_dependent_mode_gets_node_per_parent() {
        let mut def = GrammarDef::new("Test");
        let value = def.add(Mode::new().ends_with_parent());
        let shared = def.add(Mode::new().begin("s").end("s"));
        let a = def.add(Mode::new().begin("a").end("a").contains([value, shared]));
        let b = def.add(Mode::new().begin("b").end("b").contains([value, shared]));
        def.root = Mode::new().contains([a, b]);
        let compiled = compile_grammar(&def).unwrap();

        let a_children = begins(&compiled, 1);
        let b_children = begins(&compiled, 4);
        assert_ne!(a_children[0], b_children[0]);
        assert_eq!(a_children[1], b_children[1]);
    }

    #[test]
    fn test_cyclic_grammar_compiles() {
        let mut def = GrammarDef::new("Test");
        let object = def.reserve();
        let value = def.add(
            Mode::new()
                .begin(":")
                .end(",")
                .ends_with_parent()
                .contains([object]),
        );
        def.define(object, Mode::new().begin(r"\{").end(r"\}").contains([value]));
        def.root = Mode::new().contains([object]);
        let compiled = compile_grammar(&def).unwrap();

        assert_eq!(compiled.len(), 3);
        assert_eq!(begins(&compiled, 2)[0], RuleKind::Begin(1));
    }

    #[test]
    fn test_runaway_dependent_nesting_is_bounded() {
        let mut def = GrammarDef::new("Test");
        let nested = def.reserve();
        def.define(
            nested,
            Mode::new().begin("x").ends_with_parent().contains([nested]),
        );
        def.root = Mode::new().contains([nested]);
        assert_eq!(
            compile_grammar(&def).unwrap_err(),
            GrammarError::NestingTooDeep { limit: MAX_NESTING }
        );
    }

    #[test]
    fn test_starts_compiles_under_same_parent() {
        let mut def = GrammarDef::new("Test");
        let value = def.add(Mode::new().class_name("value").end("$").ends_with_parent());
        let attr = def.add(Mode::new().class_name("attr").begin(r"\w+").starts(value));
        def.root = Mode::new().contains([attr]);
        let compiled = compile_grammar(&def).unwrap();

        let attr_node = &compiled.nodes[1];
        let value_node = attr_node.starts.unwrap();
        assert_eq!(compiled.nodes[value_node].class_name.as_deref(), Some("value"));
    }

    #[test]
    fn test_unknown_mode_reference() {
        let mut def = GrammarDef::new("Test");
        def.root = Mode::new().contains([ModeId(42)]);
        assert_eq!(
            compile_grammar(&def).unwrap_err(),
            GrammarError::UnknownMode { id: ModeId(42) }
        );
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let mut def = GrammarDef::new("Test");
        let broken = def.add(Mode::new().begin("(").end("x"));
        def.root = Mode::new().contains([broken]);
        assert!(matches!(
            compile_grammar(&def),
            Err(GrammarError::InvalidPattern { .. })
        ));
    }
}

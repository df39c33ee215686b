//! Lexer/Parser Engine
//!
//! A stack machine over one [`CompiledGrammar`]. Each step runs the matcher of the
//! innermost active mode from the cursor and reacts to what fired:
//!
//! - a child's begin pushes the child,
//! - the mode's end pops it (and any modes it ends together with),
//! - an illegal pattern stops the parse unless illegals are tolerated.
//!
//! Text between matches collects in a buffer owned by the current mode. The buffer is
//! flushed into the token tree, split into keywords or handed to a sub-language,
//! whenever the active mode changes.
//!
//! Safeguards keep pathological grammars and input from hanging or crashing the
//! caller. An empty end right after an empty begin at the same spot forces the cursor
//! one character forward. A scan that needs far more steps than it has consumed input
//! is abandoned as a runaway loop, and so is one that nests modes too deeply.

use super::result::{Continuation, Frame, HighlightResult, IllegalContext};
use crate::compiling::{
    anchored_regex, CompiledGrammar, CompiledMode, NodeId, RuleKind, RuleMatch, ROOT,
};
use crate::compiling::regex_compose::escape_literal;
use crate::error::{EngineFault, HighlightError};
use crate::formats::render_html;
use crate::grammar::{BeginMatch, GuardVerdict, SubLanguage};
use crate::highlighter::Highlighter;
use crate::token_tree::{Scope, TokenTree};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

/// Iterations allowed before the runaway check starts comparing against progress.
const RUNAWAY_ITERATIONS: usize = 100_000;

/// Modes that may be open at once, not counting the root.
const MAX_MODE_DEPTH: usize = 1_000;

/// Bytes of input on each side of the cursor quoted in an illegal report.
const CONTEXT_WINDOW: usize = 100;

/// Why a scan stopped before the end of the input.
#[derive(Debug)]
enum Halt {
    Illegal { lexeme: String },
    Fault(EngineFault),
    Error(HighlightError),
}

impl From<EngineFault> for Halt {
    fn from(fault: EngineFault) -> Self {
        Halt::Fault(fault)
    }
}

impl From<HighlightError> for Halt {
    fn from(err: HighlightError) -> Self {
        Halt::Error(err)
    }
}

/// Highlight `code` with an already compiled grammar.
pub(crate) fn highlight_compiled(
    highlighter: &Highlighter,
    grammar: &CompiledGrammar,
    language: &str,
    code: &str,
    ignore_illegals: bool,
    continuation: Option<&Continuation>,
) -> Result<HighlightResult, HighlightError> {
    let config = highlighter.config();
    let mut engine = Engine::new(highlighter, grammar, code, ignore_illegals);
    engine.resume(continuation);

    match engine.scan() {
        Ok(()) => {
            let top = engine.snapshot();
            let (tree, relevance) = engine.finish();
            Ok(HighlightResult {
                value: render_html(&tree, &config.class_prefix),
                language: language.to_string(),
                relevance,
                tree,
                top: Some(top),
                ..HighlightResult::plaintext(language, code)
            })
        }
        Err(Halt::Illegal { lexeme }) => {
            let mode = engine.top_mode().class_name.clone();
            let index = engine.index;
            let message = format!(
                "Illegal lexeme \"{lexeme}\" for mode \"{}\"",
                mode.as_deref().unwrap_or("<unnamed>")
            );
            let (tree, _) = engine.finish();
            Ok(HighlightResult {
                illegal: true,
                illegal_by: Some(IllegalContext {
                    message,
                    context: context_window(code, index).to_string(),
                    mode,
                    index,
                }),
                sofar: Some(render_html(&tree, &config.class_prefix)),
                tree,
                ..HighlightResult::plaintext(language, code)
            })
        }
        Err(Halt::Fault(fault)) if config.safe_mode => {
            warn!(language, %fault, "highlighting failed, falling back to plain text");
            let top = engine.snapshot();
            Ok(HighlightResult {
                error_raised: Some(fault),
                top: Some(top),
                ..HighlightResult::plaintext(language, code)
            })
        }
        Err(Halt::Fault(fault)) => Err(fault.into()),
        Err(Halt::Error(err)) => Err(err),
    }
}

/// `code` sliced to `CONTEXT_WINDOW` bytes around `index`, widened to char boundaries.
fn context_window(code: &str, index: usize) -> &str {
    let mut start = index.saturating_sub(CONTEXT_WINDOW).min(code.len());
    while !code.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = index.saturating_add(CONTEXT_WINDOW).min(code.len());
    while !code.is_char_boundary(end) {
        end += 1;
    }
    &code[start..end]
}

struct Engine<'a> {
    highlighter: &'a Highlighter,
    grammar: &'a CompiledGrammar,
    code: &'a str,
    ignore_illegals: bool,
    safe_mode: bool,
    frames: Vec<Frame>,
    tree: TokenTree,
    buffer: String,
    relevance: u32,
    /// Sub-language name to its running state, for this call only.
    continuations: HashMap<String, Continuation>,
    last_match: Option<RuleMatch>,
    index: usize,
    /// First rule the matcher may use at the next step.
    resume_at: usize,
    continue_same_position: bool,
}

impl<'a> Engine<'a> {
    fn new(
        highlighter: &'a Highlighter,
        grammar: &'a CompiledGrammar,
        code: &'a str,
        ignore_illegals: bool,
    ) -> Self {
        Self {
            highlighter,
            grammar,
            code,
            ignore_illegals,
            safe_mode: highlighter.config().safe_mode,
            frames: vec![Frame::new(ROOT)],
            tree: TokenTree::new(),
            buffer: String::new(),
            relevance: 0,
            continuations: HashMap::new(),
            last_match: None,
            index: 0,
            resume_at: 0,
            continue_same_position: false,
        }
    }

    /// Reopen the modes of an earlier call. A continuation that does not fit this
    /// grammar is ignored.
    fn resume(&mut self, continuation: Option<&Continuation>) {
        let Some(continuation) = continuation else {
            return;
        };
        let fits = continuation.frames.first().map(|frame| frame.node) == Some(ROOT)
            && continuation
                .frames
                .iter()
                .all(|frame| frame.node < self.grammar.len());
        if !fits {
            return;
        }
        self.frames = continuation.frames.clone();
        let grammar = self.grammar;
        for frame in &self.frames[1..] {
            if let Some(class_name) = &grammar.nodes[frame.node].class_name {
                self.tree.open_node(class_name);
            }
        }
    }

    fn top_node(&self) -> NodeId {
        self.frames.last().map_or(ROOT, |frame| frame.node)
    }

    fn top_mode(&self) -> &'a CompiledMode {
        let grammar = self.grammar;
        &grammar.nodes[self.top_node()]
    }

    fn snapshot(&self) -> Continuation {
        Continuation {
            frames: self.frames.clone(),
        }
    }

    /// Collapse the stack to the root and hand out the tree and score.
    fn finish(mut self) -> (Scope, u32) {
        self.frames.truncate(1);
        (self.tree.finish(), self.relevance)
    }

    fn scan(&mut self) -> Result<(), Halt> {
        let code = self.code;
        let mut iterations = 0usize;

        loop {
            iterations += 1;
            if self.continue_same_position {
                self.continue_same_position = false;
            } else {
                self.resume_at = 0;
            }

            let matcher = &self.top_mode().matcher;
            let Some(found) = matcher.exec(code, self.index, self.resume_at)? else {
                break;
            };
            if let RuleKind::Begin(_) = found.kind {
                self.resume_at = matcher.resume_after(found.position);
            }
            trace!(kind = ?found.kind, start = found.start, end = found.end, "match");

            if iterations > RUNAWAY_ITERATIONS && iterations > found.start * 3 {
                return Err(EngineFault::RunawayLoop {
                    iterations,
                    index: found.start,
                }
                .into());
            }

            let before = &code[self.index..found.start];
            let processed = self.process_lexeme(before, Some(found))?;
            self.index = found.start + processed;
            if self.index > code.len() {
                break;
            }
        }

        let rest = &code[self.index.min(code.len())..];
        self.process_lexeme(rest, None)?;
        Ok(())
    }

    /// Handle one match (or the tail of the input when `found` is `None`) and return
    /// how far past the match start the cursor moves.
    fn process_lexeme(&mut self, before: &str, found: Option<RuleMatch>) -> Result<usize, Halt> {
        self.buffer.push_str(before);

        let Some(found) = found else {
            self.process_buffer()?;
            return Ok(0);
        };
        let lexeme = found.lexeme(self.code);

        if let Some(last) = self.last_match {
            let stalled = matches!(last.kind, RuleKind::Begin(_))
                && found.kind == RuleKind::End
                && last.start == found.start
                && lexeme.is_empty();
            if stalled {
                if !self.safe_mode {
                    return Err(EngineFault::ZeroWidthMatch { index: found.start }.into());
                }
                return Ok(self.push_next_char(found.start));
            }
        }
        self.last_match = Some(found);

        // an illegal match with nothing to consume, e.g. `$`, only steps forward
        if found.kind == RuleKind::Illegal && lexeme.is_empty() {
            return Ok(self.push_next_char(found.start));
        }

        match found.kind {
            RuleKind::Begin(node) => return self.do_begin(found, node),
            RuleKind::Illegal if !self.ignore_illegals => {
                return Err(Halt::Illegal {
                    lexeme: lexeme.to_string(),
                });
            }
            RuleKind::End => {
                if let Some(processed) = self.do_end(found)? {
                    return Ok(processed);
                }
            }
            RuleKind::Illegal => {}
        }

        // an end whose exact pattern did not match here, or a tolerated illegal
        self.buffer.push_str(lexeme);
        Ok(lexeme.len())
    }

    /// Move the character at `at` into the buffer and return its length, or 1 at the
    /// end of the input.
    fn push_next_char(&mut self, at: usize) -> usize {
        match self.code[at..].chars().next() {
            Some(next) => {
                self.buffer.push(next);
                next.len_utf8()
            }
            None => 1,
        }
    }

    fn do_begin(&mut self, found: RuleMatch, node: NodeId) -> Result<usize, Halt> {
        let grammar = self.grammar;
        let mode = &grammar.nodes[node];
        let lexeme = found.lexeme(self.code);

        if let Some(guard) = mode.begin_guard {
            let candidate = BeginMatch {
                text: self.code,
                start: found.start,
                end: found.end,
            };
            match guard.check(&candidate) {
                GuardVerdict::Accept => {}
                GuardVerdict::Ignore => return Ok(self.do_ignore(found)),
                GuardVerdict::Abort => {
                    if lexeme.is_empty() {
                        return Ok(self.push_next_char(found.start));
                    }
                    self.buffer.push_str(lexeme);
                    return Ok(lexeme.len());
                }
            }
        }

        let end_override = if mode.flags.end_same_as_begin {
            let literal = anchored_regex(&escape_literal(lexeme), false)
                .map_err(HighlightError::from)?;
            Some(Arc::new(literal))
        } else {
            None
        };

        if mode.flags.skip {
            self.buffer.push_str(lexeme);
        } else {
            if mode.flags.exclude_begin {
                self.buffer.push_str(lexeme);
            }
            self.process_buffer()?;
            if !mode.flags.return_begin && !mode.flags.exclude_begin {
                self.buffer = lexeme.to_string();
            }
        }
        self.start_new_mode(node, end_override, found.start)?;

        Ok(if mode.flags.return_begin { 0 } else { lexeme.len() })
    }

    /// A guard rejected the begin: try the remaining rules here, or step over one
    /// character once every begin rule has had its turn.
    fn do_ignore(&mut self, found: RuleMatch) -> usize {
        if self.resume_at == 0 {
            self.push_next_char(found.start)
        } else {
            self.continue_same_position = true;
            0
        }
    }

    fn start_new_mode(
        &mut self,
        node: NodeId,
        end_override: Option<Arc<fancy_regex::Regex>>,
        index: usize,
    ) -> Result<(), Halt> {
        if self.frames.len() > MAX_MODE_DEPTH {
            return Err(EngineFault::NestingTooDeep {
                limit: MAX_MODE_DEPTH,
                index,
            }
            .into());
        }
        let grammar = self.grammar;
        if let Some(class_name) = &grammar.nodes[node].class_name {
            self.tree.open_node(class_name);
        }
        self.frames.push(Frame { node, end_override });
        Ok(())
    }

    fn do_end(&mut self, found: RuleMatch) -> Result<Option<usize>, Halt> {
        let grammar = self.grammar;
        let lexeme = found.lexeme(self.code);
        let remainder = &self.code[found.start..];
        let Some(end_index) = self.end_of_mode(remainder)? else {
            return Ok(None);
        };

        let origin = self.top_mode();
        if origin.flags.skip {
            self.buffer.push_str(lexeme);
        } else {
            if !(origin.flags.return_end || origin.flags.exclude_end) {
                self.buffer.push_str(lexeme);
            }
            self.process_buffer()?;
            if origin.flags.exclude_end {
                self.buffer = lexeme.to_string();
            }
        }

        let closed = self.frames[end_index].clone();
        while self.frames.len() > end_index {
            let Some(frame) = self.frames.pop() else { break };
            let mode = &grammar.nodes[frame.node];
            if mode.class_name.is_some() {
                self.tree.close_node();
            }
            if !mode.flags.skip && mode.sub_language.is_none() {
                self.relevance = self.relevance.saturating_add(mode.relevance);
            }
        }

        let end_mode = &grammar.nodes[closed.node];
        if let Some(next) = end_mode.starts {
            let inherited = if end_mode.flags.end_same_as_begin {
                closed.end_override
            } else {
                None
            };
            self.start_new_mode(next, inherited, found.start)?;
        }

        Ok(Some(if origin.flags.return_end { 0 } else { lexeme.len() }))
    }

    /// Index of the frame an end match at `remainder` closes, if any.
    ///
    /// Starts at the innermost mode and defers to the parent while the mode ends with
    /// it. A mode that ends its parent widens the close upwards, but never to the root.
    fn end_of_mode(&self, remainder: &str) -> Result<Option<usize>, Halt> {
        let grammar = self.grammar;
        let mut index = self.frames.len() - 1;
        loop {
            let frame = &self.frames[index];
            let mode = &grammar.nodes[frame.node];
            let end_re = frame.end_override.as_deref().or(mode.end_re.as_ref());
            let matched = match end_re {
                Some(end_re) => end_re.is_match(remainder).map_err(EngineFault::from)?,
                None => false,
            };

            if matched {
                while index > 1 && grammar.nodes[self.frames[index].node].flags.ends_parent {
                    index -= 1;
                }
                return Ok(Some(index));
            }
            if mode.flags.ends_with_parent && index > 0 {
                index -= 1;
                continue;
            }
            return Ok(None);
        }
    }

    fn process_buffer(&mut self) -> Result<(), Halt> {
        let mode = self.top_mode();
        match &mode.sub_language {
            Some(sub_language) => self.process_sub_language(mode, sub_language)?,
            None => self.process_keywords(mode)?,
        }
        self.buffer.clear();
        Ok(())
    }

    fn process_keywords(&mut self, mode: &CompiledMode) -> Result<(), Halt> {
        let Some(keywords) = &mode.keywords else {
            self.tree.add_text(&self.buffer);
            return Ok(());
        };

        let buffer = std::mem::take(&mut self.buffer);
        let mut pending = String::new();
        let mut last = 0;
        for word in mode.lexemes_re.find_iter(&buffer) {
            let word = word.map_err(EngineFault::from)?;
            pending.push_str(&buffer[last..word.start()]);

            let text = word.as_str();
            let entry = if self.grammar.case_insensitive {
                keywords.get(&text.to_lowercase())
            } else {
                keywords.get(text)
            };
            match entry {
                Some(entry) => {
                    self.tree.add_text(&pending);
                    pending.clear();
                    self.relevance = self.relevance.saturating_add(entry.relevance);
                    self.tree.add_keyword(text, &entry.class_name);
                }
                None => pending.push_str(text),
            }
            last = word.end();
        }
        pending.push_str(&buffer[last..]);
        self.tree.add_text(&pending);
        Ok(())
    }

    fn process_sub_language(
        &mut self,
        mode: &CompiledMode,
        sub_language: &SubLanguage,
    ) -> Result<(), Halt> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let code = std::mem::take(&mut self.buffer);

        let result = match sub_language {
            SubLanguage::Named(name) => {
                if self.highlighter.get_grammar(name).is_none() {
                    warn!(sub_language = %name, "sub-language is not registered, keeping text as is");
                    self.tree.add_text(&code);
                    return Ok(());
                }
                let result = self.highlighter.highlight_with_continuation(
                    name,
                    &code,
                    true,
                    self.continuations.get(name),
                )?;
                if let Some(top) = &result.top {
                    self.continuations.insert(name.clone(), top.clone());
                }
                result
            }
            SubLanguage::Auto(candidates) if candidates.is_empty() => {
                self.highlighter.highlight_auto(&code)?
            }
            SubLanguage::Auto(candidates) => {
                self.highlighter.highlight_auto_among(&code, candidates.as_slice())?
            }
        };

        if mode.relevance > 0 {
            self.relevance = self.relevance.saturating_add(result.relevance);
        }
        let kind = (!result.is_plaintext()).then(|| result.language.clone());
        self.tree.add_sublanguage(result.tree, kind.as_deref());
        Ok(())
    }
}

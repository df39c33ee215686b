//! Grammar definitions: a mode table plus language metadata
//!
//! Modes are stored in an arena and referenced by [`ModeId`], which keeps ownership
//! acyclic even when the grammar itself is not (JSON values contain objects that
//! contain values). Use [`GrammarDef::reserve`] to obtain an id before the mode it
//! names can be written, then [`GrammarDef::define`] to fill it in.

use super::mode::{Mode, ModeId, ModeRef};

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarDef {
    /// Display name, e.g. `"JSON"`.
    pub name: String,
    pub aliases: Vec<String>,
    pub case_insensitive: bool,
    /// Excluded from auto-detection when set.
    pub disable_autodetect: bool,
    /// Top-level mode. Its `begin`/`end` are ignored.
    pub root: Mode,
    modes: Vec<Mode>,
}

impl GrammarDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            case_insensitive: false,
            disable_autodetect: false,
            root: Mode::new(),
            modes: Vec::new(),
        }
    }

    /// Stand-in used when a real definition cannot be built: highlights nothing and
    /// never takes part in auto-detection.
    pub fn plaintext(name: impl Into<String>) -> Self {
        Self::new(name).disable_autodetect()
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn disable_autodetect(mut self) -> Self {
        self.disable_autodetect = true;
        self
    }

    pub fn root(mut self, root: Mode) -> Self {
        self.root = root;
        self
    }

    /// Add a mode to the table.
    pub fn add(&mut self, mode: Mode) -> ModeId {
        self.modes.push(mode);
        ModeId(self.modes.len() - 1)
    }

    /// Allocate an empty mode to be filled in later with [`GrammarDef::define`].
    pub fn reserve(&mut self) -> ModeId {
        self.add(Mode::new())
    }

    /// Replace the mode stored under `id`.
    pub fn define(&mut self, id: ModeId, mode: Mode) {
        if let Some(slot) = self.modes.get_mut(id.0) {
            *slot = mode;
        }
    }

    /// Add a copy of an existing mode with `overrides` merged over it.
    ///
    /// Needed whenever a parent-dependent mode must appear under a second parent
    /// with different settings.
    pub fn add_inherited(&mut self, base: ModeId, overrides: Mode) -> ModeId {
        let merged = self
            .mode(base)
            .map(|mode| mode.inherit(&overrides))
            .unwrap_or(overrides);
        self.add(merged)
    }

    pub fn mode(&self, id: ModeId) -> Option<&Mode> {
        self.modes.get(id.0)
    }

    pub fn mode_mut(&mut self, id: ModeId) -> Option<&mut Mode> {
        self.modes.get_mut(id.0)
    }

    /// Append `modes` to the `contains` list of `id`.
    pub fn push_contains<I, R>(&mut self, id: ModeId, modes: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<ModeRef>,
    {
        if let Some(mode) = self.modes.get_mut(id.0) {
            mode.contains
                .get_or_insert_with(Vec::new)
                .extend(modes.into_iter().map(Into::into));
        }
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// For every mode in the table, whether its end depends on the parent it is
    /// placed under: it ends with its parent, or a `starts` continuation does.
    ///
    /// Such modes get a separate compiled instance per parent.
    pub fn parent_dependencies(&self) -> Vec<bool> {
        (0..self.modes.len())
            .map(|index| self.depends_on_parent(&self.modes[index]))
            .collect()
    }

    /// Whether `mode` (which need not be stored in the table) depends on its parent.
    pub fn depends_on_parent(&self, mode: &Mode) -> bool {
        let mut current = Some(mode);
        // a starts chain that loops back on itself is bounded by the table size
        let mut remaining = self.modes.len() + 1;
        while let Some(mode) = current {
            if mode.is_ends_with_parent() {
                return true;
            }
            if remaining == 0 {
                return false;
            }
            remaining -= 1;
            current = mode.starts.and_then(|id| self.mode(id));
        }
        false
    }
}

//! Token Tree Emitter
//!
//! The engine reports what it finds as a stream of events: text, keywords, and the
//! opening and closing of classed modes. [`TokenTree`] turns that stream into a tree
//! of [`TokenNode`]s whose text leaves, read in order, reproduce the input exactly.
//!
//! Open scopes live on a stack and are attached to their parent when closed, so the
//! tree handed out by [`TokenTree::finish`] is always well formed.

use serde::Serialize;

/// A child of a [`Scope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenNode {
    Text(String),
    Scope(Scope),
}

/// A tagged span of the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope {
    /// Class of the span; `None` for the root and for untagged embedded results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Set when the span holds the whole result of an embedded grammar.
    #[serde(skip_serializing_if = "is_false")]
    pub sublanguage: bool,
    pub children: Vec<TokenNode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Scope {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Concatenation of all text leaves below this scope.
    pub fn text(&self) -> String {
        let mut collector = TextCollector::default();
        self.walk(&mut collector);
        collector.text
    }

    /// Visit this scope and everything below it, depth first.
    pub fn walk(&self, visitor: &mut dyn TreeVisitor) {
        visitor.open(self);
        for child in &self.children {
            match child {
                TokenNode::Text(text) => visitor.text(text),
                TokenNode::Scope(scope) => scope.walk(visitor),
            }
        }
        visitor.close(self);
    }
}

/// Callbacks for [`Scope::walk`]. Every method defaults to doing nothing.
pub trait TreeVisitor {
    fn open(&mut self, _scope: &Scope) {}
    fn text(&mut self, _text: &str) {}
    fn close(&mut self, _scope: &Scope) {}
}

#[derive(Default)]
struct TextCollector {
    text: String,
}

impl TreeVisitor for TextCollector {
    fn text(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

/// Event sink building a [`Scope`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTree {
    /// `stack[0]` is the root; the last entry receives new children.
    stack: Vec<Scope>,
}

impl Default for TokenTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenTree {
    pub fn new() -> Self {
        Self {
            stack: vec![Scope::default()],
        }
    }

    /// Number of open scopes, counting the root.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn top(&mut self) -> &mut Scope {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Append text to the innermost open scope, merging with a preceding text leaf.
    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let top = self.top();
        match top.children.last_mut() {
            Some(TokenNode::Text(previous)) => previous.push_str(text),
            _ => top.children.push(TokenNode::Text(text.to_string())),
        }
    }

    /// Add `text` wrapped in its own scope of class `kind`.
    pub fn add_keyword(&mut self, text: &str, kind: &str) {
        if text.is_empty() {
            return;
        }
        self.open_node(kind);
        self.add_text(text);
        self.close_node();
    }

    pub fn open_node(&mut self, kind: &str) {
        self.stack.push(Scope::new(kind));
    }

    /// Close the innermost open scope. Does nothing at the root.
    pub fn close_node(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(scope) = self.stack.pop() {
            self.top().children.push(TokenNode::Scope(scope));
        }
    }

    pub fn close_all_nodes(&mut self) {
        while self.stack.len() > 1 {
            self.close_node();
        }
    }

    /// Embed the finished tree of another grammar as one opaque scope.
    pub fn add_sublanguage(&mut self, mut embedded: Scope, kind: Option<&str>) {
        embedded.kind = kind.map(str::to_string);
        embedded.sublanguage = true;
        self.top().children.push(TokenNode::Scope(embedded));
    }

    /// Close everything still open and return the root.
    pub fn finish(mut self) -> Scope {
        self.close_all_nodes();
        self.stack.pop().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_text_merges() {
        let mut tree = TokenTree::new();
        tree.add_text("a");
        tree.add_text("");
        tree.add_text("b");
        let root = tree.finish();
        assert_eq!(root.children, vec![TokenNode::Text("ab".to_string())]);
    }

    #[test]
    fn test_keyword_becomes_scope() {
        let mut tree = TokenTree::new();
        tree.add_text("let ");
        tree.add_keyword("mut", "keyword");
        tree.add_keyword("", "keyword");
        let root = tree.finish();

        assert_eq!(root.children.len(), 2);
        match &root.children[1] {
            TokenNode::Scope(scope) => {
                assert_eq!(scope.kind.as_deref(), Some("keyword"));
                assert_eq!(scope.text(), "mut");
            }
            other => panic!("expected a scope, got {other:?}"),
        }
    }

    #[test]
    fn test_close_at_root_is_noop() {
        let mut tree = TokenTree::new();
        tree.close_node();
        tree.add_text("x");
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.finish().text(), "x");
    }

    #[test]
    fn test_finish_closes_open_scopes() {
        let mut tree = TokenTree::new();
        tree.open_node("string");
        tree.open_node("subst");
        tree.add_text("x");
        assert_eq!(tree.depth(), 3);

        let root = tree.finish();
        let TokenNode::Scope(string) = &root.children[0] else {
            panic!("expected a scope");
        };
        let TokenNode::Scope(subst) = &string.children[0] else {
            panic!("expected a nested scope");
        };
        assert_eq!(subst.kind.as_deref(), Some("subst"));
    }

    #[test]
    fn test_sublanguage_embeds_root() {
        let mut inner = TokenTree::new();
        inner.add_keyword("true", "literal");

        let mut outer = TokenTree::new();
        outer.add_text("body: ");
        outer.add_sublanguage(inner.finish(), Some("json"));
        let root = outer.finish();

        let TokenNode::Scope(embedded) = &root.children[1] else {
            panic!("expected a scope");
        };
        assert!(embedded.sublanguage);
        assert_eq!(embedded.kind.as_deref(), Some("json"));
        assert_eq!(root.text(), "body: true");
    }

    #[test]
    fn test_walk_order() {
        #[derive(Default)]
        struct Events(Vec<String>);
        impl TreeVisitor for Events {
            fn open(&mut self, scope: &Scope) {
                self.0.push(format!("<{}", scope.kind.as_deref().unwrap_or("root")));
            }
            fn text(&mut self, text: &str) {
                self.0.push(text.to_string());
            }
            fn close(&mut self, _scope: &Scope) {
                self.0.push(">".to_string());
            }
        }

        let mut tree = TokenTree::new();
        tree.add_text("a");
        tree.add_keyword("b", "k");
        let mut events = Events::default();
        tree.finish().walk(&mut events);
        assert_eq!(events.0, vec!["<root", "a", "<k", "b", ">", ">"]);
    }

    #[test]
    fn test_serializes_untagged() {
        let mut tree = TokenTree::new();
        tree.add_keyword("1", "number");
        let json = serde_json::to_string(&tree.finish()).unwrap();
        assert_eq!(
            json,
            r#"{"children":[{"kind":"number","children":["1"]}]}"#
        );
    }
}

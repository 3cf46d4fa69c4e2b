//! Stylesheet tree node types.
//!
//! The tree keeps every byte of formatting it was parsed from in per-node `raws`, so a
//! parsed stylesheet stringifies back to its exact source text. Nodes created by
//! transforms leave their raws empty and have them inferred from the surrounding
//! document when printed (see [`crate::stringify`]).

use std::ops::ControlFlow;

use pigment_carton::CompactString;
use serde::{Deserialize, Serialize};

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Root = 0,
    Rule = 1,
    AtRule = 2,
    Declaration = 3,
    Comment = 4,
}

/// Source position in the stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Byte offset from start of file
    pub offset: u32,
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column number
    pub column: u32,
}

impl Position {
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// Source location span [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::STUB
    }
}

impl SourceLocation {
    /// Stub location for generated nodes
    pub const STUB: Self = Self {
        start: Position {
            offset: 0,
            line: 1,
            column: 1,
        },
        end: Position {
            offset: 0,
            line: 1,
            column: 1,
        },
    };

    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Root of a parsed stylesheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub nodes: Vec<Node>,
    pub raws: RootRaws,
}

/// Formatting of the root container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootRaws {
    /// Whitespace after the last node
    pub after: String,
    /// Whether the last declaration or statement at-rule ends with `;`
    pub semicolon: Option<bool>,
}

/// Any child node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Declaration(Declaration),
    Comment(Comment),
}

/// Selector with a declaration block: `.a { color: red }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub raws: RuleRaws,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRaws {
    /// Whitespace before the selector
    pub before: Option<String>,
    /// Whitespace between the selector and `{`
    pub between: Option<String>,
    /// Whitespace before `}`
    pub after: Option<String>,
    /// Whether the last declaration ends with `;`
    pub semicolon: Option<bool>,
    /// Stray `;` (with leading whitespace) following the closing `}`
    pub own_semicolon: Option<String>,
}

/// At-rule, with or without a block: `@media screen { }`, `@value a: b;`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtRule {
    pub name: CompactString,
    pub params: String,
    /// `None` for statement at-rules terminated by `;`
    pub nodes: Option<Vec<Node>>,
    pub raws: AtRuleRaws,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtRuleRaws {
    pub before: Option<String>,
    /// Whitespace between the name and the params
    pub after_name: Option<String>,
    /// Whitespace between the params and `{` or `;`
    pub between: Option<String>,
    pub after: Option<String>,
    pub semicolon: Option<bool>,
}

/// Property declaration: `color: red !important`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declaration {
    pub prop: CompactString,
    pub value: String,
    pub important: bool,
    pub raws: DeclarationRaws,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationRaws {
    pub before: Option<String>,
    /// Text between the property and the value, including the colon
    pub between: Option<String>,
    /// Exact `!important` text when it differs from ` !important`
    pub important: Option<String>,
    /// Original value text when it differs from the clean value
    pub value: Option<RawValue>,
}

/// Original text of a value, valid only while the value is unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct RawValue {
    pub value: String,
    pub raw: String,
}

/// Block comment: `/* text */`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub text: String,
    pub raws: CommentRaws,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentRaws {
    pub before: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

/// Position of a node during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkContext {
    /// Number of containers between the node and the root (root children are depth 0)
    pub depth: usize,
    /// Index within the parent container
    pub index: usize,
}

impl WalkContext {
    /// Whether the node is the first child of the root
    #[inline]
    pub fn is_first_in_root(&self) -> bool {
        self.depth == 0 && self.index == 0
    }
}

impl Root {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Root
    }

    /// Insert nodes at the top of the document, preserving their order.
    ///
    /// The former first node loses its "first in document" position, so when its
    /// leading whitespace has no line break it takes the leading whitespace of the
    /// former second node instead (or has it inferred when there is none).
    pub fn prepend(&mut self, nodes: Vec<Node>) {
        if nodes.is_empty() {
            return;
        }

        let glued = self
            .nodes
            .first()
            .map(|first| first.before().map_or(true, |b| !b.contains('\n')));
        if glued == Some(true) {
            let next_before = self.nodes.get(1).and_then(Node::before).map(str::to_owned);
            self.nodes[0].set_before(next_before);
        }

        self.nodes.splice(0..0, nodes);
    }

    /// Visit every node in document order, depth first.
    pub fn walk<'a, B, F>(&'a self, f: &mut F) -> ControlFlow<B>
    where
        F: FnMut(&'a Node, WalkContext) -> ControlFlow<B>,
    {
        walk_nodes(&self.nodes, 0, f)
    }

    /// Visit every node mutably in document order, depth first.
    pub fn walk_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Node),
    {
        walk_nodes_mut(&mut self.nodes, f);
    }

    /// Remove every node (at any depth) for which `keep` returns `false`.
    pub fn retain_deep<F>(&mut self, keep: &mut F)
    where
        F: FnMut(&Node) -> bool,
    {
        retain_nodes(&mut self.nodes, keep);
    }
}

fn walk_nodes<'a, B, F>(nodes: &'a [Node], depth: usize, f: &mut F) -> ControlFlow<B>
where
    F: FnMut(&'a Node, WalkContext) -> ControlFlow<B>,
{
    for (index, node) in nodes.iter().enumerate() {
        f(node, WalkContext { depth, index })?;
        if let Some(children) = node.nodes() {
            walk_nodes(children, depth + 1, f)?;
        }
    }
    ControlFlow::Continue(())
}

fn walk_nodes_mut<F>(nodes: &mut [Node], f: &mut F)
where
    F: FnMut(&mut Node),
{
    for node in nodes.iter_mut() {
        f(node);
        if let Some(children) = node.nodes_mut() {
            walk_nodes_mut(children, f);
        }
    }
}

fn retain_nodes<F>(nodes: &mut Vec<Node>, keep: &mut F)
where
    F: FnMut(&Node) -> bool,
{
    nodes.retain(|node| keep(node));
    for node in nodes.iter_mut() {
        if let Some(children) = node.nodes_mut() {
            retain_nodes(children, keep);
        }
    }
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Rule(_) => NodeType::Rule,
            Self::AtRule(_) => NodeType::AtRule,
            Self::Declaration(_) => NodeType::Declaration,
            Self::Comment(_) => NodeType::Comment,
        }
    }

    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Rule(n) => &n.loc,
            Self::AtRule(n) => &n.loc,
            Self::Declaration(n) => &n.loc,
            Self::Comment(n) => &n.loc,
        }
    }

    /// Own leading whitespace, if recorded
    pub fn before(&self) -> Option<&str> {
        match self {
            Self::Rule(n) => n.raws.before.as_deref(),
            Self::AtRule(n) => n.raws.before.as_deref(),
            Self::Declaration(n) => n.raws.before.as_deref(),
            Self::Comment(n) => n.raws.before.as_deref(),
        }
    }

    pub fn set_before(&mut self, before: Option<String>) {
        match self {
            Self::Rule(n) => n.raws.before = before,
            Self::AtRule(n) => n.raws.before = before,
            Self::Declaration(n) => n.raws.before = before,
            Self::Comment(n) => n.raws.before = before,
        }
    }

    /// Whitespace before the closing `}` of a block node
    pub fn after(&self) -> Option<&str> {
        match self {
            Self::Rule(n) => n.raws.after.as_deref(),
            Self::AtRule(n) => n.raws.after.as_deref(),
            Self::Declaration(_) | Self::Comment(_) => None,
        }
    }

    /// Children of a block node
    pub fn nodes(&self) -> Option<&[Node]> {
        match self {
            Self::Rule(n) => Some(&n.nodes),
            Self::AtRule(n) => n.nodes.as_deref(),
            Self::Declaration(_) | Self::Comment(_) => None,
        }
    }

    pub fn nodes_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Rule(n) => Some(&mut n.nodes),
            Self::AtRule(n) => n.nodes.as_mut(),
            Self::Declaration(_) | Self::Comment(_) => None,
        }
    }
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Default::default()
        }
    }
}

impl AtRule {
    pub fn new(name: impl Into<CompactString>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            ..Default::default()
        }
    }
}

impl Declaration {
    pub fn new(prop: impl Into<CompactString>, value: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Value text as written, falling back to the clean value once it was changed
    pub fn raw_value(&self) -> &str {
        match &self.raws.value {
            Some(raw) if raw.value == self.value => &raw.raw,
            _ => &self.value,
        }
    }
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

impl From<Rule> for Node {
    fn from(node: Rule) -> Self {
        Self::Rule(node)
    }
}

impl From<AtRule> for Node {
    fn from(node: AtRule) -> Self {
        Self::AtRule(node)
    }
}

impl From<Declaration> for Node {
    fn from(node: Declaration) -> Self {
        Self::Declaration(node)
    }
}

impl From<Comment> for Node {
    fn from(node: Comment) -> Self {
        Self::Comment(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_with_before(selector: &str, before: Option<&str>) -> Node {
        let mut rule = Rule::new(selector);
        rule.raws.before = before.map(str::to_owned);
        rule.into()
    }

    #[test]
    fn test_prepend_keeps_order() {
        let mut root = Root::new();
        root.nodes.push(rule_with_before(".a", Some("")));
        root.prepend(vec![Rule::new(":import(x)").into(), Rule::new(":export").into()]);

        let selectors: Vec<_> = root
            .nodes
            .iter()
            .map(|n| match n {
                Node::Rule(r) => r.selector.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(selectors, [":import(x)", ":export", ".a"]);
    }

    #[test]
    fn test_prepend_unglues_former_first() {
        let mut root = Root::new();
        root.nodes.push(rule_with_before(".a", Some(" ")));
        root.nodes.push(rule_with_before(".b", Some("\n\n")));
        root.prepend(vec![Rule::new(":export").into()]);
        assert_eq!(root.nodes[1].before(), Some("\n\n"));

        let mut root = Root::new();
        root.nodes.push(rule_with_before(".a", Some(" ")));
        root.prepend(vec![Rule::new(":export").into()]);
        assert_eq!(root.nodes[1].before(), None);
    }

    #[test]
    fn test_prepend_keeps_line_break() {
        let mut root = Root::new();
        root.nodes.push(rule_with_before(".a", Some("\n\n")));
        root.prepend(vec![Rule::new(":export").into()]);
        assert_eq!(root.nodes[1].before(), Some("\n\n"));
    }

    #[test]
    fn test_walk_depth_and_stop() {
        let mut media = AtRule::new("media", "screen");
        let mut inner = Rule::new(".a");
        inner.nodes.push(Declaration::new("color", "red").into());
        media.nodes = Some(vec![inner.into()]);

        let mut root = Root::new();
        root.nodes.push(media.into());
        root.nodes.push(Rule::new(".b").into());

        let mut seen = Vec::new();
        let _ = root.walk(&mut |node, ctx| {
            seen.push((node.node_type(), ctx.depth, ctx.index));
            ControlFlow::<()>::Continue(())
        });
        assert_eq!(
            seen,
            [
                (NodeType::AtRule, 0, 0),
                (NodeType::Rule, 1, 0),
                (NodeType::Declaration, 2, 0),
                (NodeType::Rule, 0, 1),
            ]
        );

        let found = root.walk(&mut |node, _| match node {
            Node::Declaration(d) => ControlFlow::Break(d.value.clone()),
            _ => ControlFlow::Continue(()),
        });
        assert_eq!(found, ControlFlow::Break("red".to_string()));
    }

    #[test]
    fn test_retain_deep() {
        let mut media = AtRule::new("media", "print");
        media.nodes = Some(vec![AtRule::new("value", "a: b").into(), Rule::new(".x").into()]);
        let mut root = Root::new();
        root.nodes.push(AtRule::new("value", "c: d").into());
        root.nodes.push(media.into());

        root.retain_deep(&mut |node| !matches!(node, Node::AtRule(a) if a.name == "value"));

        assert_eq!(root.nodes.len(), 1);
        assert_eq!(root.nodes[0].nodes().map(<[Node]>::len), Some(1));
    }

    #[test]
    fn test_raw_value_invalidated_by_change() {
        let mut decl = Declaration::new("color", "red");
        decl.raws.value = Some(RawValue {
            value: "red".into(),
            raw: "red  ".into(),
        });
        assert_eq!(decl.raw_value(), "red  ");
        decl.value = "blue".into();
        assert_eq!(decl.raw_value(), "blue");
    }
}

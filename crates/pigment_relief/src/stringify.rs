//! Stylesheet tree to source text.
//!
//! Own raws are printed verbatim. Missing raws (nodes built by a transform) are inferred
//! from the first node in the document that has the corresponding raw, so generated
//! rules follow the indentation, colon spacing and semicolon style of the file they
//! are inserted into. Each inferred raw is computed once per stringification.

use std::ops::ControlFlow;

use pigment_carton::FxHashMap;

use crate::ast::*;

/// Raw kinds that can be inferred from the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RawKey {
    Colon,
    Indent,
    BeforeDecl,
    BeforeRule,
    BeforeOpen,
    BeforeClose,
    BeforeComment,
    EmptyBody,
    CommentLeft,
    CommentRight,
}

impl RawKey {
    const fn default_value(self) -> &'static str {
        match self {
            Self::Colon => ": ",
            Self::Indent => "    ",
            Self::BeforeDecl | Self::BeforeRule | Self::BeforeClose | Self::BeforeComment => "\n",
            Self::BeforeOpen => " ",
            Self::EmptyBody => "",
            Self::CommentLeft | Self::CommentRight => " ",
        }
    }
}

/// Stringify a stylesheet tree
pub fn stringify(root: &Root) -> String {
    Stringifier::new(root).finish()
}

impl Root {
    /// Print the tree back to stylesheet source
    pub fn to_css(&self) -> String {
        stringify(self)
    }
}

/// Stringifier with a per-document cache of inferred raws
pub struct Stringifier<'a> {
    root: &'a Root,
    out: String,
    cache: FxHashMap<RawKey, String>,
    semicolon: Option<bool>,
}

impl<'a> Stringifier<'a> {
    pub fn new(root: &'a Root) -> Self {
        Self {
            root,
            out: String::new(),
            cache: FxHashMap::default(),
            semicolon: None,
        }
    }

    /// Print the whole document
    pub fn finish(mut self) -> String {
        let root = self.root;
        self.body(&root.nodes, root.raws.semicolon, 0);
        self.out.push_str(&root.raws.after);
        self.out
    }

    fn body(&mut self, nodes: &[Node], own_semicolon: Option<bool>, depth: usize) {
        let mut last = nodes.len().saturating_sub(1);
        while last > 0 && matches!(nodes[last], Node::Comment(_)) {
            last -= 1;
        }
        let semicolon = match own_semicolon {
            Some(semicolon) => semicolon,
            None => self.inferred_semicolon(),
        };

        for (index, child) in nodes.iter().enumerate() {
            let before = self.before(child, depth, index);
            self.out.push_str(&before);
            self.node(child, depth, last != index || semicolon);
        }
    }

    fn node(&mut self, node: &Node, depth: usize, semicolon: bool) {
        match node {
            Node::Rule(rule) => self.rule(rule, depth),
            Node::AtRule(at_rule) => self.at_rule(at_rule, depth, semicolon),
            Node::Declaration(decl) => self.declaration(decl, semicolon),
            Node::Comment(comment) => self.comment(comment),
        }
    }

    fn rule(&mut self, rule: &Rule, depth: usize) {
        self.block(
            &rule.selector,
            rule.raws.between.as_deref(),
            &rule.nodes,
            rule.raws.after.as_deref(),
            rule.raws.semicolon,
            depth,
        );
        if let Some(own) = &rule.raws.own_semicolon {
            self.out.push_str(own);
        }
    }

    fn at_rule(&mut self, at_rule: &AtRule, depth: usize, semicolon: bool) {
        let mut start = String::with_capacity(at_rule.name.len() + at_rule.params.len() + 2);
        start.push('@');
        start.push_str(&at_rule.name);
        match &at_rule.raws.after_name {
            Some(after_name) => start.push_str(after_name),
            None if !at_rule.params.is_empty() => start.push(' '),
            None => {}
        }
        start.push_str(&at_rule.params);

        match &at_rule.nodes {
            Some(nodes) => self.block(
                &start,
                at_rule.raws.between.as_deref(),
                nodes,
                at_rule.raws.after.as_deref(),
                at_rule.raws.semicolon,
                depth,
            ),
            None => {
                self.out.push_str(&start);
                if let Some(between) = &at_rule.raws.between {
                    self.out.push_str(between);
                }
                if semicolon {
                    self.out.push(';');
                }
            }
        }
    }

    fn declaration(&mut self, decl: &Declaration, semicolon: bool) {
        let between = match &decl.raws.between {
            Some(between) => between.clone(),
            None => self.inferred(RawKey::Colon),
        };
        self.out.push_str(&decl.prop);
        self.out.push_str(&between);
        self.out.push_str(decl.raw_value());
        if decl.important {
            self.out
                .push_str(decl.raws.important.as_deref().unwrap_or(" !important"));
        }
        if semicolon {
            self.out.push(';');
        }
    }

    fn comment(&mut self, comment: &Comment) {
        let left = match &comment.raws.left {
            Some(left) => left.clone(),
            None => self.inferred(RawKey::CommentLeft),
        };
        let right = match &comment.raws.right {
            Some(right) => right.clone(),
            None => self.inferred(RawKey::CommentRight),
        };
        self.out.push_str("/*");
        self.out.push_str(&left);
        self.out.push_str(&comment.text);
        self.out.push_str(&right);
        self.out.push_str("*/");
    }

    fn block(
        &mut self,
        start: &str,
        between: Option<&str>,
        nodes: &[Node],
        after: Option<&str>,
        semicolon: Option<bool>,
        depth: usize,
    ) {
        let between = match between {
            Some(between) => between.to_owned(),
            None => self.inferred(RawKey::BeforeOpen),
        };
        self.out.push_str(start);
        self.out.push_str(&between);
        self.out.push('{');

        let after = if nodes.is_empty() {
            match after {
                Some(after) => after.to_owned(),
                None => self.inferred(RawKey::EmptyBody),
            }
        } else {
            self.body(nodes, semicolon, depth + 1);
            match after {
                Some(after) => after.to_owned(),
                None => {
                    let close = self.inferred(RawKey::BeforeClose);
                    self.indented(close, depth)
                }
            }
        };
        self.out.push_str(&after);
        self.out.push('}');
    }

    fn before(&mut self, node: &Node, depth: usize, index: usize) -> String {
        if let Some(before) = node.before() {
            return before.to_owned();
        }
        if depth == 0 && index == 0 {
            return String::new();
        }
        let key = match node {
            Node::Declaration(_) => RawKey::BeforeDecl,
            Node::Comment(_) => RawKey::BeforeComment,
            Node::Rule(_) | Node::AtRule(_) => RawKey::BeforeRule,
        };
        let value = self.inferred(key);
        self.indented(value, depth)
    }

    /// Append one indent per nesting level when the whitespace breaks the line
    fn indented(&mut self, mut value: String, depth: usize) -> String {
        if value.contains('\n') {
            let indent = self.inferred(RawKey::Indent);
            for _ in 0..depth {
                value.push_str(&indent);
            }
        }
        value
    }

    fn inferred(&mut self, key: RawKey) -> String {
        if let Some(value) = self.cache.get(&key) {
            return value.clone();
        }
        let value = self
            .detect(key)
            .unwrap_or_else(|| key.default_value().to_owned());
        self.cache.insert(key, value.clone());
        value
    }

    fn detect(&mut self, key: RawKey) -> Option<String> {
        let root = self.root;
        match key {
            RawKey::Colon => first_match(root, |node, _| match node {
                Node::Declaration(decl) => decl
                    .raws
                    .between
                    .as_deref()
                    .map(|b| {
                        b.chars()
                            .filter(|c| c.is_whitespace() || *c == ':')
                            .collect::<String>()
                    }),
                _ => None,
            }),
            RawKey::Indent => first_match(root, |node, ctx| {
                if ctx.depth != 1 {
                    return None;
                }
                node.before().map(|before| {
                    let last_line = before.rsplit('\n').next().unwrap_or_default();
                    only_whitespace(last_line)
                })
            }),
            RawKey::BeforeDecl => {
                match first_match(root, |node, _| match node {
                    Node::Declaration(decl) => decl.raws.before.as_deref().map(strip_last_line),
                    _ => None,
                }) {
                    Some(value) => Some(only_whitespace(&value)),
                    None => Some(self.inferred(RawKey::BeforeRule)),
                }
            }
            RawKey::BeforeComment => {
                match first_match(root, |node, _| match node {
                    Node::Comment(comment) => comment.raws.before.as_deref().map(strip_last_line),
                    _ => None,
                }) {
                    Some(value) => Some(only_whitespace(&value)),
                    None => Some(self.inferred(RawKey::BeforeDecl)),
                }
            }
            RawKey::BeforeRule => first_match(root, |node, ctx| {
                if node.nodes().is_none() || ctx.is_first_in_root() {
                    return None;
                }
                node.before().map(strip_last_line)
            })
            .map(|value| only_whitespace(&value)),
            RawKey::BeforeClose => first_match(root, |node, _| {
                if node.nodes().map_or(true, <[Node]>::is_empty) {
                    return None;
                }
                node.after().map(strip_last_line)
            })
            .map(|value| only_whitespace(&value)),
            RawKey::BeforeOpen => first_match(root, |node, _| match node {
                Node::Rule(rule) => rule.raws.between.clone(),
                Node::AtRule(at_rule) if at_rule.nodes.is_some() => at_rule.raws.between.clone(),
                _ => None,
            }),
            RawKey::EmptyBody => first_match(root, |node, _| {
                if node.nodes().is_some_and(<[Node]>::is_empty) {
                    node.after().map(str::to_owned)
                } else {
                    None
                }
            }),
            RawKey::CommentLeft => first_match(root, |node, _| match node {
                Node::Comment(comment) => comment.raws.left.as_deref().map(only_whitespace),
                _ => None,
            }),
            RawKey::CommentRight => first_match(root, |node, _| match node {
                Node::Comment(comment) => comment.raws.right.as_deref().map(only_whitespace),
                _ => None,
            }),
        }
    }

    fn inferred_semicolon(&mut self) -> bool {
        if let Some(semicolon) = self.semicolon {
            return semicolon;
        }
        let semicolon = first_match(self.root, |node, _| {
            let children = node.nodes()?;
            if !matches!(children.last(), Some(Node::Declaration(_))) {
                return None;
            }
            match node {
                Node::Rule(rule) => rule.raws.semicolon,
                Node::AtRule(at_rule) => at_rule.raws.semicolon,
                Node::Declaration(_) | Node::Comment(_) => None,
            }
        })
        .unwrap_or(false);
        self.semicolon = Some(semicolon);
        semicolon
    }
}

/// First `Some` produced by `f` over the document, in walk order
fn first_match<T, F>(root: &Root, mut f: F) -> Option<T>
where
    F: FnMut(&Node, WalkContext) -> Option<T>,
{
    match root.walk(&mut |node, ctx| match f(node, ctx) {
        Some(found) => ControlFlow::Break(found),
        None => ControlFlow::Continue(()),
    }) {
        ControlFlow::Break(found) => Some(found),
        ControlFlow::Continue(()) => None,
    }
}

/// Drop the text after the last line break (indentation is re-added per depth)
fn strip_last_line(value: &str) -> String {
    match value.rfind('\n') {
        Some(pos) => value[..=pos].to_owned(),
        None => value.to_owned(),
    }
}

fn only_whitespace(value: &str) -> String {
    value.chars().filter(|c| c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(prop: &str, value: &str, before: &str) -> Node {
        let mut decl = Declaration::new(prop, value);
        decl.raws.before = Some(before.to_owned());
        decl.into()
    }

    #[test]
    fn test_generated_rule_uses_defaults() {
        let mut rule = Rule::new(":export");
        rule.raws.after = Some("\n".into());
        rule.nodes.push(decl("red", "blue", "\n  "));
        let root = Root {
            nodes: vec![rule.into()],
            ..Default::default()
        };
        assert_eq!(root.to_css(), ":export {\n  red: blue\n}");
    }

    #[test]
    fn test_generated_rule_follows_document_style() {
        let mut generated = Rule::new(":export");
        generated.raws.after = Some("\n".into());
        generated.nodes.push(decl("a", "b", "\n  "));
        generated.nodes.push(decl("c", "d", "\n  "));

        let mut existing = Rule::new(".foo");
        existing.raws.between = Some("  ".into());
        existing.raws.after = Some(" ".into());
        existing.raws.semicolon = Some(true);
        let mut color = Declaration::new("color", "red");
        color.raws.before = Some(" ".into());
        color.raws.between = Some(" : ".into());
        existing.nodes.push(color.into());

        let root = Root {
            nodes: vec![generated.into(), existing.into()],
            ..Default::default()
        };
        assert_eq!(
            root.to_css(),
            ":export  {\n  a : b;\n  c : d;\n}\n.foo  { color : red; }"
        );
    }

    #[test]
    fn test_nested_inferred_indent() {
        let mut inner = Rule::new(".a");
        inner.nodes.push(Declaration::new("color", "red").into());
        let mut media = AtRule::new("media", "print");
        media.nodes = Some(vec![inner.into()]);
        let root = Root {
            nodes: vec![media.into()],
            ..Default::default()
        };
        assert_eq!(
            root.to_css(),
            "@media print {\n    .a {\n        color: red\n    }\n}"
        );
    }

    #[test]
    fn test_statement_at_rule_and_comment() {
        let mut import = AtRule::new("import", "\"a.css\"");
        import.raws.between = Some(String::new());
        let mut comment = Comment::new("note");
        comment.raws.before = Some("\n".into());
        let root = Root {
            nodes: vec![import.into(), comment.into()],
            raws: RootRaws {
                after: "\n".into(),
                semicolon: Some(true),
            },
        };
        assert_eq!(root.to_css(), "@import \"a.css\";\n/* note */\n");
    }

    #[test]
    fn test_important_and_raw_value() {
        let mut d = Declaration::new("color", "red");
        d.important = true;
        d.raws.important = Some("!IMPORTANT".into());
        let mut rule = Rule::new("a");
        rule.nodes.push(d.into());
        let root = Root {
            nodes: vec![rule.into()],
            ..Default::default()
        };
        assert_eq!(root.to_css(), "a {\n    color: red!IMPORTANT\n}");
    }
}

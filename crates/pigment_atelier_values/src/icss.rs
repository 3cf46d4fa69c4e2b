//! Interchange rules: `:import(path) { alias: name }` and `:export { name: value }`.
//!
//! Existing top-level interchange rules are lifted out of the document into a symbol
//! table before the pass runs, and the table is written back as interchange rules at
//! the top of the document when it finishes. The formatting of every extracted rule
//! and declaration is remembered, so hand-written rules survive a pass unchanged and
//! new entries are appended in the same style.

use pigment_carton::{CompactString, FxHashMap};
use pigment_relief::{Declaration, DeclarationRaws, Node, Root, Rule, RuleRaws};

use crate::declaration::ImportPath;
use crate::symbols::SymbolTable;

const EXPORT_SELECTOR: &str = ":export";

/// Kind of an interchange rule selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interchange {
    Import(ImportPath),
    Export,
}

/// Classify a rule selector
pub fn parse_interchange_selector(selector: &str) -> Option<Interchange> {
    let selector = selector.trim();
    if selector == EXPORT_SELECTOR {
        return Some(Interchange::Export);
    }

    let inner = selector.strip_prefix(":import(")?.strip_suffix(')')?.trim();
    let path = match inner.as_bytes() {
        [quote @ (b'"' | b'\''), .., last] if last == quote => {
            let value = &inner[1..inner.len() - 1];
            if value.contains(char::from(*quote)) {
                return None;
            }
            ImportPath::quoted(value, char::from(*quote))
        }
        [] => return None,
        _ if inner.contains(['"', '\'']) => return None,
        _ => ImportPath::bare(inner),
    };
    Some(Interchange::Import(path))
}

/// Formatting of one extracted interchange rule
#[derive(Debug, Clone)]
struct RuleLayout {
    selector: String,
    raws: RuleRaws,
    /// Whether the rule opened the document
    first_in_root: bool,
    entries: FxHashMap<CompactString, DeclarationRaws>,
    /// Leading whitespace of the last entry, reused for appended entries
    entry_before: Option<String>,
}

impl RuleLayout {
    fn new(rule: &Rule, first_in_root: bool) -> Self {
        Self {
            selector: rule.selector.clone(),
            raws: rule.raws.clone(),
            first_in_root,
            entries: FxHashMap::default(),
            entry_before: None,
        }
    }

    fn record(&mut self, decl: &Declaration) {
        self.entries
            .entry(decl.prop.clone())
            .or_insert_with(|| decl.raws.clone());
        // Comments before an entry belong to that entry only
        if let Some(before) = &decl.raws.before {
            self.entry_before = Some(before.chars().filter(|c| c.is_whitespace()).collect());
        }
    }
}

/// Formatting of all interchange rules found in a document
#[derive(Debug, Clone, Default)]
pub struct InterchangeLayout {
    imports: FxHashMap<String, RuleLayout>,
    export: Option<RuleLayout>,
}

impl InterchangeLayout {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.export.is_none()
    }
}

/// Remove top-level interchange rules, returning their contents and formatting
pub fn extract_interchange(root: &mut Root) -> (SymbolTable, InterchangeLayout) {
    let mut table = SymbolTable::default();
    let mut layout = InterchangeLayout::default();

    let nodes = std::mem::take(&mut root.nodes);
    for (index, node) in nodes.into_iter().enumerate() {
        let Node::Rule(rule) = node else {
            root.nodes.push(node);
            continue;
        };
        match parse_interchange_selector(&rule.selector) {
            Some(Interchange::Import(path)) => {
                let rule_layout = layout
                    .imports
                    .entry(path.value.clone())
                    .or_insert_with(|| RuleLayout::new(&rule, index == 0));
                let source = table.import_source(&path);
                for decl in declarations(&rule) {
                    rule_layout.record(decl);
                    source
                        .aliases
                        .insert(decl.prop.clone(), decl.value.as_str().into());
                }
            }
            Some(Interchange::Export) => {
                let rule_layout = layout
                    .export
                    .get_or_insert_with(|| RuleLayout::new(&rule, index == 0));
                for decl in declarations(&rule) {
                    rule_layout.record(decl);
                    table.exports.insert(decl.prop.clone(), decl.value.clone());
                }
            }
            None => root.nodes.push(Node::Rule(rule)),
        }
    }

    tracing::trace!(
        imports = layout.imports.len(),
        export = layout.export.is_some(),
        "extracted interchange rules"
    );
    (table, layout)
}

fn declarations(rule: &Rule) -> impl Iterator<Item = &Declaration> {
    rule.nodes.iter().filter_map(|node| match node {
        Node::Declaration(decl) => Some(decl),
        _ => None,
    })
}

/// Build interchange rules for a table: every import source in first-seen order,
/// then `:export` when there is anything to export.
pub fn interchange_rules(table: &SymbolTable, layout: &InterchangeLayout) -> Vec<Node> {
    let mut rules = Vec::with_capacity(table.imports.len() + 1);

    for (path, source) in &table.imports {
        let rule_layout = layout.imports.get(path);
        let selector = match rule_layout {
            Some(rule_layout) => rule_layout.selector.clone(),
            None => {
                let path = ImportPath {
                    value: path.clone(),
                    quote: source.quote,
                };
                format!(":import({})", path.to_selector_arg())
            }
        };
        let entries = source
            .aliases
            .iter()
            .map(|(alias, name)| entry(alias, name, rule_layout))
            .collect();
        rules.push(interchange_rule(selector, entries, rule_layout));
    }

    if !table.exports.is_empty() || layout.export.is_some() {
        let rule_layout = layout.export.as_ref();
        let entries = table
            .exports
            .iter()
            .map(|(name, value)| entry(name, value, rule_layout))
            .collect();
        rules.push(interchange_rule(
            EXPORT_SELECTOR.to_owned(),
            entries,
            rule_layout,
        ));
    }

    // Extracted rules may land in a different position than they were taken from
    for (index, node) in rules.iter_mut().enumerate() {
        let Node::Rule(rule) = node else { continue };
        let keep = if index == 0 {
            layout
                .imports
                .values()
                .chain(layout.export.as_ref())
                .any(|l| l.first_in_root && l.selector == rule.selector)
        } else {
            rule.raws.before.as_deref().is_some_and(|b| b.contains('\n'))
        };
        if !keep {
            rule.raws.before = None;
        }
    }
    rules
}

fn interchange_rule(selector: String, entries: Vec<Node>, layout: Option<&RuleLayout>) -> Node {
    let mut rule = Rule::new(selector);
    rule.raws = match layout {
        Some(layout) => layout.raws.clone(),
        None => RuleRaws {
            after: Some("\n".to_owned()),
            ..Default::default()
        },
    };
    rule.nodes = entries;
    rule.into()
}

fn entry(prop: &str, value: &str, layout: Option<&RuleLayout>) -> Node {
    let mut decl = Declaration::new(prop, value);
    match layout.and_then(|l| l.entries.get(prop)) {
        Some(raws) => decl.raws = raws.clone(),
        None => {
            let before = layout.and_then(|l| l.entry_before.clone());
            decl.raws.before = Some(before.unwrap_or_else(|| "\n  ".to_owned()));
        }
    }
    decl.into()
}

//! The values pass over one stylesheet.
//!
//! Stages, in order:
//!
//! 1. Parse the parameters of every `@value` at-rule (any depth, document order).
//!    A malformed import alias aborts here, before the tree is touched.
//! 2. Lift existing `:import`/`:export` rules into the symbol table.
//! 3. Resolve the definitions against the table.
//! 4. Remove the `@value` at-rules and substitute symbols in what remains.
//! 5. Prepend the table as interchange rules.
//!
//! A stylesheet with neither `@value` at-rules nor interchange rules is left alone.

use std::ops::ControlFlow;

use pigment_relief::{Node, Root, SourceLocation};

use crate::declaration::{parse_definition, Definition};
use crate::error::ValuesError;
use crate::icss::{extract_interchange, interchange_rules};
use crate::options::ValuesOptions;
use crate::replace::replace_in_root;
use crate::symbols::{Resolver, SymbolTable};
use crate::warning::ValuesWarning;

/// Result of running the pass on a tree
#[derive(Debug, Clone, Default)]
pub struct PassOutput {
    pub warnings: Vec<ValuesWarning>,
    pub symbols: SymbolTable,
    /// Whether the tree was modified
    pub changed: bool,
}

/// `@value` at-rule with its parsed parameters
struct ValueAtRule {
    definition: Definition,
    params: String,
    loc: SourceLocation,
}

/// Values pass
pub struct ValuesPass<'o> {
    options: &'o ValuesOptions,
}

impl<'o> ValuesPass<'o> {
    pub fn new(options: &'o ValuesOptions) -> Self {
        Self { options }
    }

    /// Run the pass, mutating the tree in place.
    ///
    /// On error the tree is unchanged.
    pub fn run(&self, root: &mut Root) -> Result<PassOutput, ValuesError> {
        let at_rules = self.collect(root)?;
        let (seed, layout) = extract_interchange(root);

        if at_rules.is_empty() && layout.is_empty() {
            tracing::debug!("no values to process");
            return Ok(PassOutput::default());
        }

        let mut resolver = Resolver::new(self.options, seed);
        for at_rule in at_rules {
            resolver.apply(at_rule.definition, &at_rule.params, at_rule.loc);
        }
        let (symbols, warnings) = resolver.finish();

        let name = self.options.at_rule_name.as_str();
        root.retain_deep(&mut |node| !is_value_at_rule(node, name));
        let replaced = replace_in_root(root, &symbols.exports);
        root.prepend(interchange_rules(&symbols, &layout));

        tracing::debug!(
            exports = symbols.exports.len(),
            imports = symbols.imports.len(),
            replaced,
            warnings = warnings.len(),
            "values pass finished"
        );

        Ok(PassOutput {
            warnings,
            symbols,
            changed: true,
        })
    }

    fn collect(&self, root: &Root) -> Result<Vec<ValueAtRule>, ValuesError> {
        let name = self.options.at_rule_name.as_str();
        let mut at_rules = Vec::new();

        let flow = root.walk(&mut |node, _| {
            let Node::AtRule(at_rule) = node else {
                return ControlFlow::Continue(());
            };
            if at_rule.name.as_str() != name {
                return ControlFlow::Continue(());
            }
            match parse_definition(&at_rule.params, self.options) {
                Ok(definition) => {
                    at_rules.push(ValueAtRule {
                        definition,
                        params: at_rule.params.clone(),
                        loc: at_rule.loc,
                    });
                    ControlFlow::Continue(())
                }
                Err(source) => ControlFlow::Break(ValuesError::MalformedAlias {
                    source,
                    at_rule: at_rule.name.to_string(),
                    params: at_rule.params.clone(),
                    line: at_rule.loc.start.line,
                    column: at_rule.loc.start.column,
                }),
            }
        });

        match flow {
            ControlFlow::Break(err) => Err(err),
            ControlFlow::Continue(()) => {
                tracing::trace!(count = at_rules.len(), "collected value at-rules");
                Ok(at_rules)
            }
        }
    }
}

fn is_value_at_rule(node: &Node, name: &str) -> bool {
    matches!(node, Node::AtRule(at_rule) if at_rule.name.as_str() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pigment_armature::parse;

    fn run(source: &str) -> (String, PassOutput) {
        let options = ValuesOptions::default();
        let mut root = parse(source).unwrap();
        let output = ValuesPass::new(&options).run(&mut root).unwrap();
        (root.to_css(), output)
    }

    #[test]
    fn test_no_values_is_noop() {
        let source = ".a { color: red }\n/* @values */\n";
        let (css, output) = run(source);
        assert_eq!(css, source);
        assert!(!output.changed);
        assert!(output.symbols.is_empty());
    }

    #[test]
    fn test_nested_value_at_rules() {
        let (css, output) = run("@media print {\n  @value ink: black;\n  .a { color: ink }\n}");
        assert!(output.warnings.is_empty());
        assert_eq!(output.symbols.exports["ink"], "black");
        insta::assert_snapshot!(css, @r###"
        :export {
          ink: black
        }
        @media print {
          .a { color: black }
        }
        "###);
    }

    #[test]
    fn test_invalid_only_removes_at_rules() {
        let (css, output) = run("@value red;");
        assert_eq!(css, "");
        assert!(output.changed);
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].message, "Invalid value definition: red");
        assert_eq!(output.warnings[0].loc.start.line, 1);
    }

    #[test]
    fn test_malformed_alias_leaves_tree_untouched() {
        let options = ValuesOptions::default();
        let source = "@value ok: 1px;\n@value a b from \"./a.css\";\n.a { margin: ok }";
        let mut root = parse(source).unwrap();
        let err = ValuesPass::new(&options).run(&mut root).unwrap_err();

        assert_eq!(
            err.to_string(),
            "malformed import alias `a b` in `@value a b from \"./a.css\"` at 2:1"
        );
        assert_eq!(root.to_css(), source);
    }

    #[test]
    fn test_forward_reference_is_substituted() {
        let (css, _) = run(".a { color: brand }\n@value brand: teal;");
        assert_eq!(css, ":export {\n  brand: teal\n}\n.a { color: teal }");
    }

    #[test]
    fn test_custom_at_rule_name() {
        let options = ValuesOptions {
            at_rule_name: "define".to_owned(),
            ..Default::default()
        };
        let mut root = parse("@define red blue;\n@value keep me;").unwrap();
        let output = ValuesPass::new(&options).run(&mut root).unwrap();
        assert_eq!(output.symbols.exports["red"], "blue");
        assert_eq!(root.to_css(), ":export {\n  red: blue\n}\n@value keep me;");
    }
}

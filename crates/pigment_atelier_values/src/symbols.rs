//! Symbol table and resolver.
//!
//! Definitions are applied in document order. A value definition is resolved against
//! the values defined before it; an import binds each local name to a freshly
//! generated alias that is unique across the table.

use pigment_carton::{format_compact, sanitize_identifier, CompactString, FxIndexMap};
use pigment_relief::SourceLocation;
use serde::Serialize;

use crate::declaration::{AliasPair, Definition, ImportPath};
use crate::options::ValuesOptions;
use crate::replace::replace_symbols;
use crate::warning::ValuesWarning;

/// Exported names in first-seen order
pub type Exports = FxIndexMap<CompactString, String>;

/// Aliases of one imported stylesheet: local alias to the name it exports
pub type Aliases = FxIndexMap<CompactString, CompactString>;

/// Aliases imported from one path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSource {
    /// Quote the path was first written with (`None` for a bare path)
    pub quote: Option<char>,
    pub aliases: Aliases,
}

/// Symbol table of one stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolTable {
    pub exports: Exports,
    /// Import sources keyed by unquoted path, in first-seen order
    pub imports: FxIndexMap<String, ImportSource>,
}

impl SymbolTable {
    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.imports.is_empty()
    }

    /// Import source for a path, created on first use
    pub fn import_source(&mut self, path: &ImportPath) -> &mut ImportSource {
        self.imports
            .entry(path.value.clone())
            .or_insert_with(|| ImportSource {
                quote: path.quote,
                aliases: Aliases::default(),
            })
    }

    /// Whether an alias is already bound under any path
    pub fn has_alias(&self, alias: &str) -> bool {
        self.imports
            .values()
            .any(|source| source.aliases.contains_key(alias))
    }
}

/// Alias name generator owned by one pass.
///
/// Names are `<prefix><sanitized local name>__<counter>`. The counter starts at zero
/// and advances on every attempt, so a name that is already taken is skipped rather
/// than reused.
#[derive(Debug, Clone)]
pub struct AliasGenerator {
    prefix: CompactString,
    counter: u32,
}

impl AliasGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    /// Next counter value to be tried
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn generate<F>(&mut self, local: &str, taken: F) -> CompactString
    where
        F: Fn(&str) -> bool,
    {
        let name = sanitize_identifier(local);
        loop {
            // Double underscore before the counter, see "Alias format" in DESIGN.md
            let alias = format_compact!("{}{}__{}", self.prefix, name, self.counter);
            self.counter += 1;
            if !taken(&alias) {
                return alias;
            }
        }
    }
}

/// Applies definitions to a symbol table
pub struct Resolver<'o> {
    options: &'o ValuesOptions,
    table: SymbolTable,
    aliases: AliasGenerator,
    warnings: Vec<ValuesWarning>,
}

impl<'o> Resolver<'o> {
    /// Start from a table pre-seeded with existing interchange rules
    pub fn new(options: &'o ValuesOptions, table: SymbolTable) -> Self {
        Self {
            options,
            table,
            aliases: AliasGenerator::new(&options.alias_prefix),
            warnings: Vec::new(),
        }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Apply one definition; `params` and `loc` identify the at-rule for warnings
    pub fn apply(&mut self, definition: Definition, params: &str, loc: SourceLocation) {
        match definition {
            Definition::Value { name, value } => self.define(name, &value, params, loc),
            Definition::Import { pairs, path } => self.import(pairs, path, params, loc),
            Definition::Invalid => {
                tracing::trace!(params, "invalid value definition");
                self.warnings
                    .push(ValuesWarning::invalid_definition(params, loc));
            }
        }
    }

    fn define(&mut self, name: CompactString, value: &str, params: &str, loc: SourceLocation) {
        let resolved = replace_symbols(value, &self.table.exports).into_owned();
        tracing::trace!(%name, %resolved, "define value");
        self.export(name, resolved, params, loc);
    }

    fn import(&mut self, pairs: Vec<AliasPair>, path: ImportPath, params: &str, loc: SourceLocation) {
        let path = self.resolve_path(path);
        tracing::trace!(path = %path.value, count = pairs.len(), "import values");

        for AliasPair { imported, local } in pairs {
            let table = &self.table;
            let alias = self.aliases.generate(&local, |candidate| {
                table.has_alias(candidate) || table.exports.contains_key(candidate)
            });
            self.export(local, alias.to_string(), params, loc);
            self.table
                .import_source(&path)
                .aliases
                .insert(alias, imported);
        }
    }

    /// A bare path naming an earlier value imports from that value's path
    fn resolve_path(&self, path: ImportPath) -> ImportPath {
        if !self.options.indirect_paths || path.quote.is_some() {
            return path;
        }
        match self.table.exports.get(path.value.as_str()) {
            Some(value) => ImportPath::from_text(value).unwrap_or_else(|| ImportPath::bare(value.as_str())),
            None => path,
        }
    }

    fn export(&mut self, name: CompactString, value: String, params: &str, loc: SourceLocation) {
        if self.table.exports.contains_key(&name) {
            self.warnings
                .push(ValuesWarning::already_declared(&name, params, loc));
        }
        self.table.exports.insert(name, value);
    }

    pub fn finish(self) -> (SymbolTable, Vec<ValuesWarning>) {
        (self.table, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::parse_definition;

    fn apply_all(resolver: &mut Resolver<'_>, params: &[&str]) {
        for params in params {
            let definition = parse_definition(params, &ValuesOptions::default()).unwrap();
            resolver.apply(definition, params, SourceLocation::STUB);
        }
    }

    #[test]
    fn test_alias_generator() {
        let mut aliases = AliasGenerator::new("__value__");
        assert_eq!(aliases.generate("red", |_| false), "__value__red__0");
        assert_eq!(aliases.generate("--red", |_| false), "__value____red__1");
        assert_eq!(
            aliases.generate("blue", |name| name == "__value__blue__2"),
            "__value__blue__3"
        );
        assert_eq!(aliases.counter(), 4);
    }

    #[test]
    fn test_transitive_values() {
        let options = ValuesOptions::default();
        let mut resolver = Resolver::new(&options, SymbolTable::default());
        apply_all(
            &mut resolver,
            &["aaa: red", "bbb: aaa", "base: 10px", "large: calc(base * 2)"],
        );
        let (table, warnings) = resolver.finish();
        assert!(warnings.is_empty());
        assert_eq!(table.exports["bbb"], "red");
        assert_eq!(table.exports["large"], "calc(10px * 2)");
    }

    #[test]
    fn test_value_fixed_at_definition_time() {
        let options = ValuesOptions::default();
        let mut resolver = Resolver::new(&options, SymbolTable::default());
        apply_all(&mut resolver, &["a: b", "b: red"]);
        let (table, _) = resolver.finish();
        assert_eq!(table.exports["a"], "b");
    }

    #[test]
    fn test_redeclaration_overwrites() {
        let options = ValuesOptions::default();
        let mut resolver = Resolver::new(&options, SymbolTable::default());
        apply_all(&mut resolver, &["red: blue", "red: green"]);
        let (table, warnings) = resolver.finish();
        assert_eq!(table.exports["red"], "green");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "\"red\" value already declared");
    }

    #[test]
    fn test_imports_in_order() {
        let options = ValuesOptions::default();
        let mut resolver = Resolver::new(&options, SymbolTable::default());
        apply_all(
            &mut resolver,
            &["b from \"./b.css\"", "a from \"./a.css\"", "blue as c from \"./b.css\""],
        );
        let (table, _) = resolver.finish();

        let paths: Vec<&str> = table.imports.keys().map(String::as_str).collect();
        assert_eq!(paths, ["./b.css", "./a.css"]);
        let aliases: Vec<(&str, &str)> = table.imports["./b.css"]
            .aliases
            .iter()
            .map(|(alias, name)| (alias.as_str(), name.as_str()))
            .collect();
        assert_eq!(
            aliases,
            [("__value__b__0", "b"), ("__value__c__2", "blue")]
        );
        assert_eq!(table.exports["c"], "__value__c__2");
    }

    #[test]
    fn test_indirect_path() {
        let options = ValuesOptions::default();
        let mut resolver = Resolver::new(&options, SymbolTable::default());
        apply_all(&mut resolver, &["colors: \"./colors.css\"", "red from colors"]);
        let (table, _) = resolver.finish();
        assert_eq!(table.imports["./colors.css"].quote, Some('"'));
        assert_eq!(table.exports["colors"], "\"./colors.css\"");

        let literal = ValuesOptions {
            indirect_paths: false,
            ..Default::default()
        };
        let mut resolver = Resolver::new(&literal, SymbolTable::default());
        apply_all(&mut resolver, &["colors: \"./colors.css\"", "red from colors"]);
        let (table, _) = resolver.finish();
        assert_eq!(table.imports["colors"].quote, None);
    }

    #[test]
    fn test_indirect_path_declared_later_is_literal() {
        let options = ValuesOptions::default();
        let mut resolver = Resolver::new(&options, SymbolTable::default());
        apply_all(&mut resolver, &["red from colors", "colors: \"./colors.css\""]);
        let (table, _) = resolver.finish();
        assert!(table.imports.contains_key("colors"));
    }

    #[test]
    fn test_alias_skips_existing_names() {
        let options = ValuesOptions::default();
        let mut seeded = SymbolTable::default();
        seeded
            .import_source(&ImportPath::bare("colors"))
            .aliases
            .insert("__value__a__0".into(), "a".into());
        let mut resolver = Resolver::new(&options, seeded);
        apply_all(&mut resolver, &["a from colors"]);
        let (table, _) = resolver.finish();

        let aliases: Vec<&str> = table.imports["colors"]
            .aliases
            .keys()
            .map(CompactString::as_str)
            .collect();
        assert_eq!(aliases, ["__value__a__0", "__value__a__1"]);
        assert_eq!(table.exports["a"], "__value__a__1");
    }

    #[test]
    fn test_invalid_warns_without_mutation() {
        let options = ValuesOptions::default();
        let mut resolver = Resolver::new(&options, SymbolTable::default());
        apply_all(&mut resolver, &["red from"]);
        let (table, warnings) = resolver.finish();
        assert!(table.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "Invalid value definition: red from");
    }
}

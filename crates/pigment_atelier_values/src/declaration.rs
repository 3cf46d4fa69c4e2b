//! `@value` parameter parsing.
//!
//! Parameters are tokenized, split at the last `from` word, and matched against the
//! definition and import shapes:
//!
//! ```text
//! @value name value;
//! @value name: value;
//! @value a, b as c from "path";
//! @value ( a, b as c ) from "path";
//! ```

use pigment_armature::{parse_value, stringify_value, trim_spaces, ValueNode};
use pigment_carton::CompactString;

use crate::error::MalformedAlias;
use crate::options::ValuesOptions;

/// Parsed `@value` parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// `name: value`
    Value { name: CompactString, value: String },
    /// `a, b as c from "path"`
    Import {
        pairs: Vec<AliasPair>,
        path: ImportPath,
    },
    /// Neither shape; reported as a warning
    Invalid,
}

/// One imported name and the local name it is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPair {
    /// Name exported by the imported stylesheet
    pub imported: CompactString,
    /// Name used in this stylesheet
    pub local: CompactString,
}

/// Import path together with the quote it was written with (`None` for a bare word)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportPath {
    pub value: String,
    pub quote: Option<char>,
}

impl ImportPath {
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quote: None,
        }
    }

    pub fn quoted(value: impl Into<String>, quote: char) -> Self {
        Self {
            value: value.into(),
            quote: Some(quote),
        }
    }

    /// Read a path from value text: one string literal or one bare word
    pub fn from_text(text: &str) -> Option<Self> {
        path_from_nodes(trim_spaces(&parse_value(text)))
    }

    /// Path as written inside `:import(...)`
    pub fn to_selector_arg(&self) -> String {
        match self.quote {
            Some(quote) => format!("{quote}{}{quote}", self.value),
            None => self.value.clone(),
        }
    }
}

/// Parse the parameters of one `@value` at-rule
pub fn parse_definition(
    params: &str,
    options: &ValuesOptions,
) -> Result<Definition, MalformedAlias> {
    // A missing `;` swallows the next at-rule into these parameters
    let nested = format!("@{}", options.at_rule_name);
    if params.contains(nested.as_str()) {
        return Ok(Definition::Invalid);
    }

    let nodes = parse_value(params);
    match nodes.iter().rposition(ValueNode::is_from_word) {
        None => Ok(parse_value_definition(&nodes, options)),
        Some(from) => parse_import(&nodes[..from], &nodes[from + 1..]),
    }
}

fn parse_value_definition(nodes: &[ValueNode], options: &ValuesOptions) -> Definition {
    let [first, separator, rest @ ..] = nodes else {
        return Definition::Invalid;
    };
    let Some(name) = first.word() else {
        return Definition::Invalid;
    };
    let separated = separator.is_colon() || (options.bare_definitions && separator.is_space());
    if rest.is_empty() || !separated {
        return Definition::Invalid;
    }

    Definition::Value {
        name: name.into(),
        value: stringify_value(trim_spaces(rest)),
    }
}

fn parse_import(aliases: &[ValueNode], path: &[ValueNode]) -> Result<Definition, MalformedAlias> {
    let Some(path) = path_from_nodes(trim_spaces(path)) else {
        return Ok(Definition::Invalid);
    };

    let aliases = trim_spaces(aliases);
    let list = match aliases {
        [ValueNode::Function { nodes, .. }] => nodes.as_slice(),
        _ => aliases,
    };

    let mut pairs = Vec::new();
    let mut has_empty_entry = false;
    for chunk in list.split(ValueNode::is_comma) {
        let words: Vec<&ValueNode> = chunk.iter().filter(|n| !n.is_space()).collect();
        match words.as_slice() {
            [] => has_empty_entry = true,
            [name] if name.is_word() => {
                let name = CompactString::from(name.word().unwrap_or_default());
                pairs.push(AliasPair {
                    imported: name.clone(),
                    local: name,
                });
            }
            [imported, as_word, local]
                if imported.is_word() && as_word.is_as_word() && local.is_word() =>
            {
                pairs.push(AliasPair {
                    imported: imported.word().unwrap_or_default().into(),
                    local: local.word().unwrap_or_default().into(),
                });
            }
            _ => {
                return Err(MalformedAlias {
                    entry: stringify_value(trim_spaces(chunk)),
                })
            }
        }
    }

    if has_empty_entry {
        return Ok(Definition::Invalid);
    }
    Ok(Definition::Import { pairs, path })
}

fn path_from_nodes(nodes: &[ValueNode]) -> Option<ImportPath> {
    match nodes {
        [ValueNode::String {
            value,
            quote,
            unclosed: false,
        }] => Some(ImportPath::quoted(value.as_str(), *quote)),
        [ValueNode::Word { value }] => Some(ImportPath::bare(value.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(params: &str) -> Definition {
        parse_definition(params, &ValuesOptions::default()).unwrap()
    }

    fn value(name: &str, value: &str) -> Definition {
        Definition::Value {
            name: name.into(),
            value: value.into(),
        }
    }

    fn pair(imported: &str, local: &str) -> AliasPair {
        AliasPair {
            imported: imported.into(),
            local: local.into(),
        }
    }

    #[test]
    fn test_value_definitions() {
        assert_eq!(parse("red blue"), value("red", "blue"));
        assert_eq!(parse("red: blue"), value("red", "blue"));
        assert_eq!(parse("red : blue"), value("red", "blue"));
        assert_eq!(parse("small (max-width: 599px)"), value("small", "(max-width: 599px)"));
        assert_eq!(
            parse("coolShadow: 0 11px 15px -7px rgba(0,0,0,.2),0 24px 38px 3px rgba(0,0,0,.14)"),
            value(
                "coolShadow",
                "0 11px 15px -7px rgba(0,0,0,.2),0 24px 38px 3px rgba(0,0,0,.14)"
            )
        );
        assert_eq!(parse("3char #0f0"), value("3char", "#0f0"));
        assert_eq!(parse("--red: #f00"), value("--red", "#f00"));
    }

    #[test]
    fn test_bare_definitions_disabled() {
        let options = ValuesOptions {
            bare_definitions: false,
            ..Default::default()
        };
        assert_eq!(parse_definition("red blue", &options), Ok(Definition::Invalid));
        assert_eq!(
            parse_definition("red: blue", &options),
            Ok(value("red", "blue"))
        );
    }

    #[test]
    fn test_invalid_definitions() {
        assert_eq!(parse("red"), Definition::Invalid);
        assert_eq!(parse("red:"), Definition::Invalid);
        assert_eq!(parse("\"red\" blue"), Definition::Invalid);
        assert_eq!(parse("red blue\n@value green yellow"), Definition::Invalid);
        assert_eq!(parse("red from"), Definition::Invalid);
        assert_eq!(parse("red from \"a\" \"b\""), Definition::Invalid);
        assert_eq!(parse("from \"./a.css\""), Definition::Invalid);
        assert_eq!(parse("a,, b from \"./a.css\""), Definition::Invalid);
    }

    #[test]
    fn test_imports() {
        assert_eq!(
            parse("red from \"./colors.css\""),
            Definition::Import {
                pairs: vec![pair("red", "red")],
                path: ImportPath::quoted("./colors.css", '"'),
            }
        );
        assert_eq!(
            parse("blue as red, green from './colors.css'"),
            Definition::Import {
                pairs: vec![pair("blue", "red"), pair("green", "green")],
                path: ImportPath::quoted("./colors.css", '\''),
            }
        );
        assert_eq!(
            parse("red from colors"),
            Definition::Import {
                pairs: vec![pair("red", "red")],
                path: ImportPath::bare("colors"),
            }
        );
    }

    #[test]
    fn test_parenthesized_import_list() {
        assert_eq!(
            parse("(\n  blue,\n  red as primary\n) from \"./colors.css\""),
            Definition::Import {
                pairs: vec![pair("blue", "blue"), pair("red", "primary")],
                path: ImportPath::quoted("./colors.css", '"'),
            }
        );
    }

    #[test]
    fn test_last_from_wins() {
        assert_eq!(
            parse("from from \"./words.css\""),
            Definition::Import {
                pairs: vec![pair("from", "from")],
                path: ImportPath::quoted("./words.css", '"'),
            }
        );
    }

    #[test]
    fn test_malformed_alias() {
        let err = parse_definition("a b from \"./a.css\"", &ValuesOptions::default()).unwrap_err();
        assert_eq!(err.entry, "a b");

        let err =
            parse_definition("red, blue as from \"./a.css\"", &ValuesOptions::default()).unwrap_err();
        assert_eq!(err.entry, "blue as");
    }

    #[test]
    fn test_import_path_from_text() {
        assert_eq!(
            ImportPath::from_text("\"./colors.css\""),
            Some(ImportPath::quoted("./colors.css", '"'))
        );
        assert_eq!(ImportPath::from_text(" colors "), Some(ImportPath::bare("colors")));
        assert_eq!(ImportPath::from_text("a b"), None);
        assert_eq!(
            ImportPath::quoted("./x.css", '\'').to_selector_arg(),
            "'./x.css'"
        );
    }
}

//! Symbol substitution.
//!
//! A symbol matches a whole value word, or a maximal run of `[A-Za-z0-9_-]` (plus
//! non-ASCII) bytes inside a word, so `red` is replaced in `red` and `.red` but not in
//! `darkred`. Words nested in function arguments are visited; function names, strings
//! and comments are not.

use std::borrow::Cow;

use pigment_armature::{parse_value, stringify_value, walk_words_mut};
use pigment_carton::{is_symbol_byte, CompactString};
use pigment_relief::{Node, RawValue, Root};

use crate::symbols::Exports;

/// Replace every symbol in `text` with its value
pub fn replace_symbols<'a>(text: &'a str, exports: &Exports) -> Cow<'a, str> {
    if exports.is_empty() || !text.bytes().any(is_symbol_byte) {
        return Cow::Borrowed(text);
    }

    let mut nodes = parse_value(text);
    let mut changed = false;
    walk_words_mut(&mut nodes, &mut |word: &mut CompactString| {
        if let Some(replaced) = replace_word(word, exports) {
            *word = replaced.into();
            changed = true;
        }
    });

    if changed {
        Cow::Owned(stringify_value(&nodes))
    } else {
        Cow::Borrowed(text)
    }
}

fn replace_word(word: &str, exports: &Exports) -> Option<String> {
    if let Some(value) = exports.get(word) {
        return Some(value.clone());
    }

    let bytes = word.as_bytes();
    let mut out = String::new();
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if !is_symbol_byte(bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && is_symbol_byte(bytes[i]) {
            i += 1;
        }
        if let Some(value) = exports.get(&word[start..i]) {
            out.push_str(&word[copied..start]);
            out.push_str(value);
            copied = i;
        }
    }

    if copied == 0 {
        return None;
    }
    out.push_str(&word[copied..]);
    Some(out)
}

/// Substitute symbols in every selector, at-rule parameter and declaration value.
///
/// Returns the number of nodes that changed.
pub fn replace_in_root(root: &mut Root, exports: &Exports) -> usize {
    let mut changed = 0;
    root.walk_mut(&mut |node| {
        let touched = match node {
            Node::Rule(rule) => replace_owned(&mut rule.selector, exports),
            Node::AtRule(at_rule) => replace_owned(&mut at_rule.params, exports),
            Node::Declaration(decl) => {
                let raw = decl
                    .raws
                    .value
                    .take()
                    .filter(|raw| raw.value == decl.value);
                let touched = replace_owned(&mut decl.value, exports);
                decl.raws.value = raw.map(|raw| RawValue {
                    raw: replace_symbols(&raw.raw, exports).into_owned(),
                    value: decl.value.clone(),
                });
                touched
            }
            Node::Comment(_) => false,
        };
        if touched {
            changed += 1;
        }
    });
    changed
}

fn replace_owned(text: &mut String, exports: &Exports) -> bool {
    match replace_symbols(text, exports) {
        Cow::Borrowed(_) => false,
        Cow::Owned(replaced) => {
            *text = replaced;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pigment_armature::parse;

    fn exports(pairs: &[(&str, &str)]) -> Exports {
        pairs
            .iter()
            .map(|(name, value)| (CompactString::from(*name), value.to_string()))
            .collect()
    }

    #[test]
    fn test_word_boundaries() {
        let exports = exports(&[("red", "blue")]);
        assert_eq!(replace_symbols("red", &exports), "blue");
        assert_eq!(replace_symbols("darkred", &exports), "darkred");
        assert_eq!(replace_symbols("red-ish", &exports), "red-ish");
        assert_eq!(replace_symbols("1px solid red", &exports), "1px solid blue");
        assert_eq!(replace_symbols(".red > .a", &exports), ".blue > .a");
    }

    #[test]
    fn test_function_arguments() {
        let exports = exports(&[("base", "10px"), ("color", "#000")]);
        assert_eq!(replace_symbols("calc(base * 2)", &exports), "calc(10px * 2)");
        assert_eq!(
            replace_symbols("0 0 base rgba(color, .5)", &exports),
            "0 0 10px rgba(#000, .5)"
        );
    }

    #[test]
    fn test_skips_strings_comments_and_names() {
        let exports = exports(&[("red", "blue"), ("calc", "nope")]);
        assert!(matches!(
            replace_symbols("\"red\" /* red */ calc(1px)", &exports),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_custom_property_names() {
        let exports = exports(&[("--red", "#f00")]);
        assert_eq!(replace_symbols("--red", &exports), "#f00");
        assert_eq!(replace_symbols("var(--red)", &exports), "var(#f00)");
        assert_eq!(replace_symbols("--reddish", &exports), "--reddish");
    }

    #[test]
    fn test_dotted_names_match_whole_word() {
        let exports = exports(&[("brand.primary", "red")]);
        assert_eq!(replace_symbols("brand.primary", &exports), "red");
        assert_eq!(replace_symbols("brand", &exports), "brand");
    }

    #[test]
    fn test_replace_in_root() {
        let mut root =
            parse("@media small {\n  .red { color: red /* keep */; }\n}\n.x { color: darkred }")
                .unwrap();
        let exports = exports(&[("red", "blue"), ("small", "(max-width: 599px)")]);
        assert_eq!(replace_in_root(&mut root, &exports), 3);
        assert_eq!(
            root.to_css(),
            "@media (max-width: 599px) {\n  .blue { color: blue /* keep */; }\n}\n.x { color: darkred }"
        );
    }
}

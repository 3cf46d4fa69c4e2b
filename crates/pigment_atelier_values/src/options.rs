//! Options for the values pass.

use serde::{Deserialize, Serialize};

/// Values pass options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesOptions {
    /// At-rule keyword that declares values (default: "value")
    #[serde(default = "default_at_rule_name")]
    pub at_rule_name: String,

    /// Namespace prefix of generated import aliases (default: "__value__")
    #[serde(default = "default_alias_prefix")]
    pub alias_prefix: String,

    /// Accept `@value name value` without a colon (default: true)
    #[serde(default = "default_true")]
    pub bare_definitions: bool,

    /// Resolve a bare import path through an earlier value of the same name (default: true)
    #[serde(default = "default_true")]
    pub indirect_paths: bool,
}

impl Default for ValuesOptions {
    fn default() -> Self {
        Self {
            at_rule_name: default_at_rule_name(),
            alias_prefix: default_alias_prefix(),
            bare_definitions: true,
            indirect_paths: true,
        }
    }
}

fn default_at_rule_name() -> String {
    "value".to_string()
}

fn default_alias_prefix() -> String {
    "__value__".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let options: ValuesOptions =
            serde_json::from_str(r#"{ "aliasPrefix": "i__", "indirectPaths": false }"#).unwrap();
        assert_eq!(options.alias_prefix, "i__");
        assert!(!options.indirect_paths);
        assert_eq!(options.at_rule_name, "value");
        assert!(options.bare_definitions);
    }

    #[test]
    fn test_empty_config_is_default() {
        let options: ValuesOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ValuesOptions::default());
    }
}

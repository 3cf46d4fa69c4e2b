//! Configuration file loading for pigment.
//!
//! Reads `pigment.config.json` from the current working directory, or the file
//! passed with `--config`.

use pigment_atelier_values::ValuesOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "pigment.config.json";

/// Top-level pigment configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PigmentConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Options of the `@value` pass.
    #[serde(default)]
    pub values: ValuesOptions,
}

/// Load the configuration.
///
/// An explicit path must exist; the default file is optional. A file that cannot be
/// read or parsed produces a warning and the default configuration.
pub fn load_config(explicit: Option<&Path>) -> PigmentConfig {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = std::env::current_dir()
                .unwrap_or_default()
                .join(CONFIG_FILE_NAME);
            if !path.exists() {
                return PigmentConfig::default();
            }
            path
        }
    };

    match read_config(&config_path) {
        Ok(config) => {
            tracing::debug!(path = %config_path.display(), "loaded config");
            config
        }
        Err(message) => {
            eprintln!("\x1b[33mWarning:\x1b[0m {}", message);
            PigmentConfig::default()
        }
    }
}

fn read_config(path: &Path) -> Result<PigmentConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_config(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

fn parse_config(content: &str) -> Result<PigmentConfig, serde_json::Error> {
    serde_json::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values_section() {
        let config = parse_config(
            r#"{
                "$schema": "./node_modules/pigment/schema.json",
                "values": { "aliasPrefix": "v__", "bareDefinitions": false }
            }"#,
        )
        .unwrap();
        assert_eq!(config.values.alias_prefix, "v__");
        assert!(!config.values.bare_definitions);
        assert_eq!(config.values.at_rule_name, "value");
        assert!(config.schema.is_some());
    }

    #[test]
    fn test_missing_values_section() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.values, ValuesOptions::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(parse_config(r#"{ "values": { "bareDefinitions": "yes" } }"#).is_err());
    }

    #[test]
    fn test_missing_explicit_file_falls_back() {
        let config = load_config(Some(Path::new("./does-not-exist/pigment.config.json")));
        assert_eq!(config.values, ValuesOptions::default());
    }
}

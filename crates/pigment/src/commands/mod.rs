//! Command implementations and the helpers they share.

pub mod build;
pub mod check;

use glob::glob;
use ignore::Walk;
use pigment_atelier_values::{process_values, ValuesOptions, ValuesResult, ValuesWarning};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::load_config;

/// Resolve pass options: config file first, then command-line overrides
pub fn values_options(config: Option<&Path>, alias_prefix: Option<&str>) -> ValuesOptions {
    let mut options = load_config(config).values;
    if let Some(prefix) = alias_prefix {
        options.alias_prefix = prefix.to_string();
    }
    options
}

/// Collect .css files using glob patterns or directory walking
pub fn collect_files(patterns: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = patterns
        .iter()
        .flat_map(|pattern| {
            if pattern.contains(['*', '?', '[']) {
                glob(pattern)
                    .ok()
                    .into_iter()
                    .flatten()
                    .filter_map(|r| r.ok())
                    .filter(|p| {
                        is_stylesheet(p)
                            && !p.components().any(|c| c.as_os_str() == "node_modules")
                    })
                    .collect::<Vec<_>>()
            } else {
                // Directory walking respects .gitignore
                Walk::new(pattern)
                    .filter_map(|e| e.ok())
                    .filter(|e| is_stylesheet(e.path()))
                    .map(|e| e.path().to_path_buf())
                    .collect::<Vec<_>>()
            }
        })
        .collect();

    files.sort();
    files.dedup();
    files
}

#[inline]
pub fn is_stylesheet(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "css")
}

/// Read and process one stylesheet
pub fn process_file(path: &Path, options: &ValuesOptions) -> Result<ValuesResult, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "processing");
    process_values(&source, options).map_err(|e| e.to_string())
}

/// `path:line:column: warning: message`
pub fn format_warning(path: &Path, warning: &ValuesWarning) -> String {
    format!(
        "{}:{}:{}: warning: {}",
        path.display(),
        warning.loc.start.line,
        warning.loc.start.column,
        warning.message
    )
}

pub fn print_warnings(path: &Path, warnings: &[ValuesWarning]) {
    for warning in warnings {
        eprintln!("{}", format_warning(path, warning));
    }
}

//! Error types for the values pass.

use pigment_relief::ParseError;
use thiserror::Error;

/// Import alias entry that is neither `name` nor `name as alias`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed import alias `{entry}`")]
pub struct MalformedAlias {
    pub entry: String,
}

/// Errors that abort the values pass
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuesError {
    /// The stylesheet could not be parsed
    #[error("Failed to parse stylesheet: {0}")]
    Parse(#[from] ParseError),

    /// An import declaration with a valid path has an unusable alias entry
    #[error("{source} in `@{at_rule} {params}` at {line}:{column}")]
    MalformedAlias {
        source: MalformedAlias,
        at_rule: String,
        params: String,
        line: u32,
        column: u32,
    },
}

//! Recoverable problems reported by the values pass.

use std::fmt;

use pigment_relief::SourceLocation;
use serde::Serialize;

/// Warning kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// Parameters that are neither a value definition nor an import
    InvalidDefinition,
    /// A name that was already exported is defined again
    AlreadyDeclared,
}

/// Warning attached to the at-rule that caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesWarning {
    pub kind: WarningKind,
    pub message: String,
    /// Parameter text of the offending at-rule
    pub text: String,
    pub loc: SourceLocation,
}

impl ValuesWarning {
    pub fn invalid_definition(params: &str, loc: SourceLocation) -> Self {
        Self {
            kind: WarningKind::InvalidDefinition,
            message: format!("Invalid value definition: {params}"),
            text: params.to_owned(),
            loc,
        }
    }

    pub fn already_declared(name: &str, params: &str, loc: SourceLocation) -> Self {
        Self {
            kind: WarningKind::AlreadyDeclared,
            message: format!("\"{name}\" value already declared"),
            text: params.to_owned(),
            loc,
        }
    }
}

impl fmt::Display for ValuesWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.loc.start.line, self.loc.start.column, self.message
        )
    }
}

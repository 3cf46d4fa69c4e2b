//! # pigment_atelier_values
//!
//! Atelier Values - The `@value` constants workshop for Pigment.
//!
//! ## Name Origin
//!
//! An **atelier** is the workshop where pigments are ground and mixed before they
//! reach the canvas. This atelier mixes a stylesheet's named values: it reads
//! `@value` declarations, resolves them into a symbol table, substitutes every usage,
//! and records the table as `:import`/`:export` interchange rules for the tools that
//! link stylesheets together.
//!
//! ## Example
//!
//! ```
//! use pigment_atelier_values::{process_values, ValuesOptions};
//!
//! let source = "@value primary: #3366ff;\n.button { color: primary; }";
//! let result = process_values(source, &ValuesOptions::default()).unwrap();
//!
//! assert_eq!(
//!     result.code,
//!     ":export {\n  primary: #3366ff;\n}\n.button { color: #3366ff; }"
//! );
//! assert!(result.warnings.is_empty());
//! ```

mod declaration;
mod error;
mod icss;
mod options;
mod pass;
mod replace;
mod symbols;
mod warning;


pub use declaration::{parse_definition, AliasPair, Definition, ImportPath};
pub use error::{MalformedAlias, ValuesError};
pub use icss::{
    extract_interchange, interchange_rules, parse_interchange_selector, Interchange,
    InterchangeLayout,
};
pub use options::ValuesOptions;
pub use pass::{PassOutput, ValuesPass};
pub use replace::{replace_in_root, replace_symbols};
pub use symbols::{AliasGenerator, Aliases, Exports, ImportSource, Resolver, SymbolTable};
pub use warning::{ValuesWarning, WarningKind};

use pigment_armature::parse;
use pigment_carton::FxIndexMap;
use serde::Serialize;

/// Result of processing one stylesheet
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesResult {
    /// Processed stylesheet
    pub code: String,
    pub warnings: Vec<ValuesWarning>,
    /// Exported names and their resolved values
    pub exports: Exports,
    /// Import sources keyed by path
    pub imports: FxIndexMap<String, ImportSource>,
}

/// Process the `@value` declarations of a stylesheet.
///
/// The input is returned verbatim when it has nothing to process.
pub fn process_values(source: &str, options: &ValuesOptions) -> Result<ValuesResult, ValuesError> {
    let mut root = parse(source)?;
    let output = ValuesPass::new(options).run(&mut root)?;

    let code = if output.changed {
        root.to_css()
    } else {
        source.to_owned()
    };

    Ok(ValuesResult {
        code,
        warnings: output.warnings,
        exports: output.symbols.exports,
        imports: output.symbols.imports,
    })
}

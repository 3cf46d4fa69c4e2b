//! Relief - The sculptured stylesheet tree for Pigment.
//!
//! A relief is a sculpture that stays attached to the surface it was carved from.
//! This crate holds the stylesheet tree that stays attached to its source text:
//! every node records the whitespace and punctuation around it, so an untouched
//! tree prints back byte for byte.
//!
//! # Example
//!
//! ```
//! use pigment_relief::{Declaration, Root, Rule};
//!
//! let mut rule = Rule::new(":export");
//! rule.nodes.push(Declaration::new("primary", "red").into());
//!
//! let mut root = Root::new();
//! root.prepend(vec![rule.into()]);
//! assert_eq!(root.to_css(), ":export {\n    primary: red\n}");
//! ```

pub mod ast;
pub mod errors;
pub mod stringify;

pub use ast::*;
pub use errors::{ErrorCode, ParseError};
pub use stringify::{stringify, Stringifier};

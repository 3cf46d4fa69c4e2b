//! Armature - The structural parser framework for Pigment.
//!
//! An armature is the internal framework a sculptor builds before adding clay.
//! This crate provides the parsers everything else is built on:
//!
//! - [`parse`]: stylesheet source to a lossless [`pigment_relief::Root`]
//! - [`parse_value`]: declaration values and at-rule parameters to [`ValueNode`] tokens
//!
//! # Example
//!
//! ```
//! use pigment_armature::{parse, parse_value, stringify_value};
//!
//! let source = "@value primary: #ff3e00;\n.a { color: primary }\n";
//! let root = parse(source).unwrap();
//! assert_eq!(root.to_css(), source);
//!
//! let tokens = parse_value("a, b as c from \"./theme.css\"");
//! assert!(tokens[0].is_word());
//! assert_eq!(stringify_value(&tokens), "a, b as c from \"./theme.css\"");
//! ```

pub mod parser;
pub mod tokenizer;
pub mod value;

pub use parser::{parse, Parser};
pub use tokenizer::{Token, TokenKind, Tokenizer};
pub use value::{parse_value, stringify_value, trim_spaces, walk_words_mut, ValueNode};

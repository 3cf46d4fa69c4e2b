//! Carton - The artist's toolbox for Pigment.
//!
//! This crate provides the foundational utilities and data structures shared by the
//! Pigment crates, much like a carton (artist's portfolio case) holds the essential
//! tools and materials an artist needs for their work.
//!
//! # Modules
//!
//! - **Collections**: insertion-ordered hash maps for symbol tables
//! - **Shared utilities**: identifier character classes and name sanitization
//!
//! # Example
//!
//! ```
//! use pigment_carton::{CompactString, FxIndexMap};
//!
//! let mut exports: FxIndexMap<CompactString, CompactString> = FxIndexMap::default();
//! exports.insert("primary".into(), "#ff3e00".into());
//! exports.insert("accent".into(), "teal".into());
//!
//! let names: Vec<&str> = exports.keys().map(|k| k.as_str()).collect();
//! assert_eq!(names, ["primary", "accent"]);
//! ```

pub mod general;

// Re-export compact_str::CompactString for convenience
pub use compact_str::{format_compact, CompactString};

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps
pub use rustc_hash::{FxBuildHasher, FxHashMap};

/// Insertion-ordered hash map using the Fx hasher.
///
/// Symbol tables depend on first-seen ordering for serialization, so every ordered
/// map in Pigment goes through this alias.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

// Re-export shared utilities
pub use general::*;

//! # Pigment
//!
//! CSS `@value` preprocessing toolchain written in Rust.
//!
//! This crate re-exports all Pigment sub-crates for unified documentation.
//!
//! ## Crates
//!
//! - [`carton`] - Shared collections and identifier helpers
//! - [`relief`] - Stylesheet syntax tree and stringifier
//! - [`armature`] - Stylesheet and value parsers
//! - [`atelier_values`] - `@value` resolution and `:import`/`:export` interchange

/// Shared collections and identifier helpers.
pub use pigment_carton as carton;

/// Stylesheet syntax tree and stringifier.
pub use pigment_relief as relief;

/// Stylesheet and value parsers.
pub use pigment_armature as armature;

/// `@value` resolution and `:import`/`:export` interchange.
pub use pigment_atelier_values as atelier_values;

//! Identifier character classes used by symbol substitution and alias generation.

use compact_str::CompactString;

/// Check if byte belongs to a symbol name run (`[A-Za-z0-9_-]` or any non-ASCII byte).
///
/// Substitution matches whole runs of these bytes, so `red` never matches inside `darkred`.
#[inline]
pub const fn is_symbol_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c >= 0x80
}

/// Check if char is a word character (`[A-Za-z0-9_]`)
#[inline]
pub const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace every non-word character with `_`.
///
/// ```
/// use pigment_carton::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("--red"), "__red");
/// assert_eq!(sanitize_identifier("brand.primary"), "brand_primary");
/// ```
pub fn sanitize_identifier(name: &str) -> CompactString {
    name.chars()
        .map(|c| if is_word_char(c) { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_bytes() {
        assert!(is_symbol_byte(b'a'));
        assert!(is_symbol_byte(b'-'));
        assert!(is_symbol_byte(b'9'));
        assert!(!is_symbol_byte(b'.'));
        assert!(!is_symbol_byte(b'#'));
        assert!(!is_symbol_byte(b'('));
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("red"), "red");
        assert_eq!(sanitize_identifier("3char"), "3char");
        assert_eq!(sanitize_identifier("a b/c"), "a_b_c");
        assert_eq!(sanitize_identifier("café"), "caf_");
    }
}

//! Byte-size formatting and parsing.
//!
//! `usize::MAX` is the "infinite" sentinel throughout the engine; it renders
//! as `inf` and parses back from it.

use std::fmt::Write;

use serde::de::{self, Visitor};
use serde::Deserializer;

const UNITS: &[(u32, &str)] = &[(40, "T"), (30, "G"), (20, "M"), (10, "K")];

/// Render a byte count with the largest unit that divides it evenly.
pub fn to_str(size: usize) -> String {
    if size == usize::MAX {
        return "inf".to_string();
    }
    for &(shift, unit) in UNITS {
        if size > 0 && size.trailing_zeros() >= shift {
            return format!("{}{}", size >> shift, unit);
        }
    }
    size.to_string()
}

/// Render an inclusive length range, e.g. `0..4K` or `8K..inf`.
pub fn range_str(start: usize, end: usize) -> String {
    let mut s = String::new();
    let _ = write!(s, "{}..{}", to_str(start), to_str(end));
    s
}

/// Parse a byte count: a plain integer, an integer with a K/M/G/T suffix
/// (case-insensitive), or `inf`.
pub fn parse(input: &str) -> Option<usize> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("inf") {
        return Some(usize::MAX);
    }
    let (digits, shift) = match input.chars().last()? {
        'k' | 'K' => (&input[..input.len() - 1], 10u32),
        'm' | 'M' => (&input[..input.len() - 1], 20),
        'g' | 'G' => (&input[..input.len() - 1], 30),
        't' | 'T' => (&input[..input.len() - 1], 40),
        _ => (input, 0),
    };
    let value: usize = digits.trim().parse().ok()?;
    value.checked_shl(shift).filter(|v| v >> shift == value)
}

struct SizeVisitor;

impl Visitor<'_> for SizeVisitor {
    type Value = usize;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a byte count, optionally with a K/M/G/T suffix, or \"inf\"")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<usize, E> {
        usize::try_from(v).map_err(|_| E::custom(format!("negative byte count: {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<usize, E> {
        usize::try_from(v).map_err(|_| E::custom(format!("byte count out of range: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<usize, E> {
        parse(v).ok_or_else(|| E::custom(format!("invalid byte count: {v:?}")))
    }
}

/// Serde adapter for size fields that accept `4096`, `"64K"` or `"inf"`.
pub fn deserialize_size<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
    d.deserialize_any(SizeVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_plain_and_suffixed_sizes() {
        assert_eq!(to_str(0), "0");
        assert_eq!(to_str(100), "100");
        assert_eq!(to_str(1024), "1K");
        assert_eq!(to_str(6144), "6K");
        assert_eq!(to_str(1 << 20), "1M");
        assert_eq!(to_str(3 << 30), "3G");
        assert_eq!(to_str(usize::MAX), "inf");
    }

    #[test]
    fn formats_ranges() {
        assert_eq!(range_str(0, 4096), "0..4K");
        assert_eq!(range_str(8192, usize::MAX), "8K..inf");
        assert_eq!(range_str(0, 111), "0..111");
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse("0"), Some(0));
        assert_eq!(parse("4096"), Some(4096));
        assert_eq!(parse("64K"), Some(64 << 10));
        assert_eq!(parse("64k"), Some(64 << 10));
        assert_eq!(parse("2M"), Some(2 << 20));
        assert_eq!(parse("1G"), Some(1 << 30));
        assert_eq!(parse("inf"), Some(usize::MAX));
        assert_eq!(parse("INF"), Some(usize::MAX));
        assert_eq!(parse(""), None);
        assert_eq!(parse("K"), None);
        assert_eq!(parse("12Q"), None);
        assert_eq!(parse("-4"), None);
    }

    #[test]
    fn format_parse_round_trip() {
        for size in [0usize, 1, 100, 1024, 6144, 1 << 20, usize::MAX] {
            assert_eq!(parse(&to_str(size)), Some(size));
        }
    }
}

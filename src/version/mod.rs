// src/version/mod.rs

//! Artifact version ordering and version ranges
//!
//! Versions are split into numeric and textual items on `.`, `-` and `_`
//! separators and on digit/letter transitions. Numeric items compare
//! numerically, textual items by qualifier rank and then lexically.
//! Trailing zeros and release qualifiers (`final`, `ga`, `release`) are
//! ignored, so `1.0`, `1` and `1.0.0.Final` are the same version.
//!
//! Ranges use interval notation:
//! - `[1.0,2.0)` → 1.0 <= x < 2.0
//! - `(1.0,]` / `(1.0,)` → x > 1.0
//! - `[1.0]` → exactly 1.0
//! - `1.0` → x >= 1.0

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Item {
    /// Digits with leading zeros stripped, so any length compares correctly
    Number(String),
    Text(String),
}

impl Item {
    fn is_zero(&self) -> bool {
        matches!(self, Item::Number(n) if n == "0")
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Rank of well-known qualifiers; releases sit at 6
fn qualifier_rank(q: &str) -> u8 {
    match q {
        "alpha" | "a" => 1,
        "beta" | "b" => 2,
        "milestone" | "m" => 3,
        "rc" | "cr" => 4,
        "snapshot" => 5,
        "" | "final" | "ga" | "release" => 6,
        "sp" => 7,
        _ => 8,
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    qualifier_rank(a)
        .cmp(&qualifier_rank(b))
        .then_with(|| a.cmp(b))
}

/// Compare an item against a missing one (the shorter version ran out)
fn compare_to_missing(item: &Item) -> Ordering {
    match item {
        Item::Number(n) if n == "0" => Ordering::Equal,
        Item::Number(_) => Ordering::Greater,
        Item::Text(t) => compare_text(t, ""),
    }
}

/// A parsed artifact version
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    items: Vec<Item>,
}

impl Version {
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() || raw.contains([',', '[', ']', '(', ')']) {
            return Err(Error::InvalidVersion(s.to_string()));
        }

        let mut items = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        let flush = |current: &mut String, in_digits: bool, items: &mut Vec<Item>| {
            if current.is_empty() {
                return;
            }
            let item = if in_digits {
                let digits = current.trim_start_matches('0');
                Item::Number(if digits.is_empty() { "0" } else { digits }.to_string())
            } else {
                Item::Text(current.to_lowercase())
            };
            items.push(item);
            current.clear();
        };

        for c in raw.chars() {
            if matches!(c, '.' | '-' | '_') {
                flush(&mut current, in_digits, &mut items);
                continue;
            }
            let digit = c.is_ascii_digit();
            if !current.is_empty() && digit != in_digits {
                flush(&mut current, in_digits, &mut items);
            }
            in_digits = digit;
            current.push(c);
        }
        flush(&mut current, in_digits, &mut items);

        // Normalize away trailing zeros and release qualifiers
        while let Some(last) = items.last() {
            let trailing = match last {
                Item::Number(_) => last.is_zero(),
                Item::Text(t) => qualifier_rank(t) == 6,
            };
            if !trailing {
                break;
            }
            items.pop();
        }

        Ok(Self {
            raw: raw.to_string(),
            items,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for i in 0..len {
            let ord = match (self.items.get(i), other.items.get(i)) {
                (Some(Item::Number(a)), Some(Item::Number(b))) => compare_numbers(a, b),
                (Some(Item::Text(a)), Some(Item::Text(b))) => compare_text(a, b),
                (Some(Item::Number(_)), Some(Item::Text(_))) => Ordering::Greater,
                (Some(Item::Text(_)), Some(Item::Number(_))) => Ordering::Less,
                (Some(a), None) => compare_to_missing(a),
                (None, Some(b)) => compare_to_missing(b).reverse(),
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.items.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: Version,
    inclusive: bool,
}

/// A single version interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    lower: Option<Bound>,
    upper: Option<Bound>,
    raw: String,
}

impl VersionRange {
    /// Parse interval notation, or a bare version meaning "at least"
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        let invalid = || Error::InvalidVersionRange(s.to_string());

        if raw.is_empty() {
            return Err(invalid());
        }

        let open = raw.chars().next().ok_or_else(invalid)?;
        if open != '[' && open != '(' {
            return Self::parse(&format!("[{},)", raw));
        }

        let close = raw.chars().last().ok_or_else(invalid)?;
        if raw.len() < 2 || (close != ']' && close != ')') {
            return Err(invalid());
        }
        let body = &raw[1..raw.len() - 1];

        let bound = |text: &str, inclusive: bool| -> Result<Option<Bound>> {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            let version = Version::parse(text).map_err(|_| invalid())?;
            Ok(Some(Bound { version, inclusive }))
        };

        if body.matches(',').count() > 1 {
            return Err(invalid());
        }

        let (lower, upper) = match body.split_once(',') {
            Some((lo, hi)) => (bound(lo, open == '[')?, bound(hi, close == ']')?),
            None => {
                // [1.0] pins a single version
                if open != '[' || close != ']' {
                    return Err(invalid());
                }
                let exact = bound(body, true)?.ok_or_else(invalid)?;
                (Some(exact.clone()), Some(exact))
            }
        };

        if let (Some(lo), Some(hi)) = (&lower, &upper) {
            let empty = match lo.version.cmp(&hi.version) {
                Ordering::Greater => true,
                Ordering::Equal => !(lo.inclusive && hi.inclusive),
                Ordering::Less => false,
            };
            if empty {
                return Err(invalid());
            }
        }

        Ok(Self {
            lower,
            upper,
            raw: raw.to_string(),
        })
    }

    /// `[version,)`
    pub fn at_least(version: &str) -> Result<Self> {
        Self::parse(&format!("[{},)", version.trim()))
    }

    /// Every version
    pub fn any() -> Self {
        Self {
            lower: None,
            upper: None,
            raw: "[,)".to_string(),
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        let above = match &self.lower {
            None => true,
            Some(b) if b.inclusive => version >= &b.version,
            Some(b) => version > &b.version,
        };
        let below = match &self.upper {
            None => true,
            Some(b) if b.inclusive => version <= &b.version,
            Some(b) => version < &b.version,
        };
        above && below
    }

    /// Highest version in `versions` that falls inside the range
    pub fn select_highest<'a, I>(&self, versions: I) -> Option<&'a Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        versions.into_iter().filter(|v| self.contains(v)).max()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("1.2") < v("1.5"));
        assert!(v("2.0.1") > v("2.0"));
        assert_eq!(v("1.007"), v("1.7"));
    }

    #[test]
    fn test_oversized_numeric_segment() {
        assert!(v("1.99999999999999999999") > v("1.1"));
        assert!(v("1.99999999999999999999") < v("1.100000000000000000000"));
        assert!(v("1.99999999999999999999") > v("1.99999999999999999998"));
    }

    #[test]
    fn test_range_delimiters_rejected_in_versions() {
        assert!(Version::parse("2.0,3.0").is_err());
        assert!(Version::parse("1.0]").is_err());
        assert!(Version::parse("(1.0").is_err());
    }

    #[test]
    fn test_release_qualifiers_are_equivalent() {
        assert_eq!(v("1.0"), v("1"));
        assert_eq!(v("1.0.0.Final"), v("1.0"));
        assert!(v("1.0.1.Final") > v("1.0.0.Final"));
    }

    #[test]
    fn test_prerelease_ordering() {
        assert!(v("1.0-SNAPSHOT") < v("1.0"));
        assert!(v("1.0.Beta1") < v("1.0.CR1"));
        assert!(v("1.0.CR1") < v("1.0.Final"));
        assert!(v("1.0.SP1") > v("1.0.Final"));
    }

    #[test]
    fn test_empty_version_rejected() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("   ").is_err());
    }

    #[test]
    fn test_half_open_range() {
        let range = VersionRange::parse("[1.0,)").unwrap();
        assert!(range.contains(&v("1.0")));
        assert!(range.contains(&v("7.3")));
        assert!(!range.contains(&v("0.9")));
    }

    #[test]
    fn test_bounded_range() {
        let range = VersionRange::parse("[2.0,3.0)").unwrap();
        assert!(range.contains(&v("2.0")));
        assert!(range.contains(&v("2.9.9")));
        assert!(!range.contains(&v("3.0")));
        assert!(!range.contains(&v("1.0")));

        let exclusive = VersionRange::parse("(2.0,3.0]").unwrap();
        assert!(!exclusive.contains(&v("2.0")));
        assert!(exclusive.contains(&v("3.0")));
    }

    #[test]
    fn test_exact_and_bare_ranges() {
        let exact = VersionRange::parse("[1.5]").unwrap();
        assert!(exact.contains(&v("1.5")));
        assert!(!exact.contains(&v("1.6")));

        let bare = VersionRange::parse("1.5").unwrap();
        assert_eq!(bare.to_string(), "[1.5,)");
        assert!(bare.contains(&v("1.6")));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(VersionRange::parse("").is_err());
        assert!(VersionRange::parse("[1.0").is_err());
        assert!(VersionRange::parse("[3.0,2.0]").is_err());
        assert!(VersionRange::parse("(1.0)").is_err());
        assert!(VersionRange::parse("[1.0,2.0,3.0]").is_err());
        assert!(VersionRange::parse("[1.0,[2.0]").is_err());
        assert!(VersionRange::parse("1.0,2.0").is_err());
    }

    #[test]
    fn test_select_highest() {
        let versions = vec![v("1.0"), v("2.5"), v("2.1"), v("3.0")];
        let range = VersionRange::parse("[2.0,3.0)").unwrap();
        assert_eq!(range.select_highest(&versions), Some(&v("2.5")));
        assert_eq!(VersionRange::parse("[4,)").unwrap().select_highest(&versions), None);
    }
}

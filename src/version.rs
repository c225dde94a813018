//! Lenient version ordering and matching for published package versions.
//!
//! opam versions are not semver: `v0.16.0`, `5.1.1`, `1.2-3` and
//! `4.14.0~alpha` all occur in the wild. A [`PackageVersion`] splits the
//! string into `.`/`-` separated segments and compares them pairwise, numeric
//! segments as integers and everything else lexically.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Request keyword selecting the newest available version.
pub const LATEST: &str = "latest";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("version string is empty")]
pub struct EmptyVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Decimal digits with leading zeros removed, so length orders first.
    Numeric(String),
    Text(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            let trimmed = raw.trim_start_matches('0');
            Segment::Numeric(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
        } else {
            Segment::Text(raw.to_string())
        }
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Numeric(a), Segment::Numeric(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Numeric(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Numeric(_)) => Ordering::Greater,
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A version string as listed by the documentation index.
///
/// Equality follows the ordering, so `1.01` and `1.1` compare equal while
/// [`PackageVersion::as_str`] still returns the listed spelling.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    raw: String,
    segments: Vec<Segment>,
}

impl PackageVersion {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when every segment of `self` equals the corresponding leading
    /// segment of `other`.
    pub fn is_prefix_of(&self, other: &PackageVersion) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a == b)
    }
}

impl FromStr for PackageVersion {
    type Err = EmptyVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(EmptyVersion);
        }
        let normalized = match raw.strip_prefix(['v', 'V']) {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
            _ => raw,
        };
        let segments: Vec<Segment> = normalized
            .split(['.', '-'])
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect();
        if segments.is_empty() {
            return Err(EmptyVersion);
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lexicographic over segments; a strict prefix is the smaller.
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

/// Maximum of `versions`, keeping the first listed among equals.
fn max_first<'a>(versions: impl Iterator<Item = &'a PackageVersion>) -> Option<&'a PackageVersion> {
    versions.reduce(|best, v| if v > best { v } else { best })
}

/// Pick the listed version that best satisfies `requested`.
///
/// `None`, an empty string, or `latest` select the newest version. Otherwise an
/// exact match wins, then the newest version that `requested` is a segment
/// prefix of. Returns `None` when nothing qualifies.
pub fn match_version<S: AsRef<str>>(requested: Option<&str>, available: &[S]) -> Option<String> {
    let versions: Vec<PackageVersion> = available
        .iter()
        .filter_map(|v| v.as_ref().parse().ok())
        .collect();

    let request = requested.map(str::trim).unwrap_or_default();
    if request.is_empty() || request.eq_ignore_ascii_case(LATEST) {
        return max_first(versions.iter()).map(|v| v.raw.clone());
    }

    let wanted: PackageVersion = request.parse().ok()?;
    if let Some(exact) = versions.iter().find(|v| v.segments == wanted.segments) {
        return Some(exact.raw.clone());
    }
    max_first(versions.iter().filter(|v| wanted.is_prefix_of(v))).map(|v| v.raw.clone())
}

/// Newest version in `available`, if any.
pub fn find_latest_version<S: AsRef<str>>(available: &[S]) -> Option<String> {
    match_version(None, available)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_numeric_segments_compare_as_integers() {
        assert!(v("1.10.0") > v("1.9.9"));
        assert!(v("10") > v("9"));
        assert!(v("1.01") == v("1.1"));
        assert!(v("123456789012345678901234567890") > v("99999999999999999999999"));
    }

    #[test]
    fn test_text_segments_compare_lexically() {
        assert!(v("1.0.beta") > v("1.0.alpha"));
        // numeric before text
        assert!(v("1.0.rc1") > v("1.0.5"));
    }

    #[test]
    fn test_shorter_prefix_is_smaller() {
        assert!(v("1.2") < v("1.2.0"));
        assert!(v("1.2") < v("1.2-1"));
    }

    #[test]
    fn test_leading_v_is_normalized() {
        assert_eq!(v("v0.16.0"), v("0.16.0"));
        assert_eq!(v("v0.16.0").as_str(), "v0.16.0");
        // not followed by a digit, kept as text
        assert_eq!(v("vendor").segments, vec![Segment::Text("vendor".into())]);
    }

    #[test]
    fn test_empty_version_rejected() {
        assert_eq!("".parse::<PackageVersion>().unwrap_err(), EmptyVersion);
        assert!("   ".parse::<PackageVersion>().is_err());
        assert!(".".parse::<PackageVersion>().is_err());
        assert!("-..-".parse::<PackageVersion>().is_err());
    }

    #[test]
    fn test_separator_only_request_not_found() {
        assert_eq!(match_version(Some("."), &["1.0", "2.0"]), None);
        assert_eq!(match_version(Some(".."), &["1.0", "2.0"]), None);
        assert_eq!(match_version(None, &["-", "0.3"]).as_deref(), Some("0.3"));
    }

    #[test]
    fn test_prefix_tie_keeps_listing_order() {
        let available = ["2.1.01", "2.1.1", "2.0.9"];
        assert_eq!(match_version(Some("2.1"), &available).as_deref(), Some("2.1.01"));
        assert_eq!(match_version(Some("2"), &available).as_deref(), Some("2.1.01"));
    }

    #[test]
    fn test_latest_selects_maximum() {
        let available = ["5.0.0", "5.10.1", "5.2.0", "4.14.2"];
        assert_eq!(match_version(Some("latest"), &available).as_deref(), Some("5.10.1"));
        assert_eq!(match_version(Some("LATEST"), &available).as_deref(), Some("5.10.1"));
        assert_eq!(match_version(Some(""), &available).as_deref(), Some("5.10.1"));
        assert_eq!(match_version(None, &available).as_deref(), Some("5.10.1"));
        assert_eq!(find_latest_version(&available).as_deref(), Some("5.10.1"));
    }

    #[test]
    fn test_latest_tie_keeps_listing_order() {
        let available = ["1.1", "1.01", "1.001"];
        assert_eq!(match_version(Some("latest"), &available).as_deref(), Some("1.1"));
    }

    #[test]
    fn test_unique_prefix_returns_entry() {
        let available = ["0.15.1", "0.16.0", "1.0.0"];
        assert_eq!(match_version(Some("0.16"), &available).as_deref(), Some("0.16.0"));
        assert_eq!(match_version(Some("1"), &available).as_deref(), Some("1.0.0"));
        assert_eq!(match_version(Some("0.16"), &["v0.16.0"]).as_deref(), Some("v0.16.0"));
    }

    #[test]
    fn test_prefix_picks_newest_match() {
        let available = ["5.0.0", "5.1.1", "5.1.0", "6.0.0"];
        assert_eq!(match_version(Some("5"), &available).as_deref(), Some("5.1.1"));
        assert_eq!(match_version(Some("5.1"), &available).as_deref(), Some("5.1.1"));
    }

    #[test]
    fn test_exact_match_preferred_over_prefix() {
        let available = ["1.2", "1.2.5"];
        assert_eq!(match_version(Some("1.2"), &available).as_deref(), Some("1.2"));
    }

    #[test]
    fn test_prefix_must_match_whole_segments() {
        assert_eq!(match_version(Some("1.1"), &["1.10.0"]), None);
    }

    #[test]
    fn test_not_found() {
        let empty: [&str; 0] = [];
        assert_eq!(match_version(Some("latest"), &empty), None);
        assert_eq!(match_version(Some("1.0"), &empty), None);
        assert_eq!(match_version(Some("3.0"), &["1.0", "2.0"]), None);
    }

    #[test]
    fn test_empty_listing_entries_are_skipped() {
        assert_eq!(match_version(None, &["", "0.1"]).as_deref(), Some("0.1"));
    }
}

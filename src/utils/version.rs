//! Server build version parsing and comparison
//!
//! Builds are dotted four-component strings such as `5.7.0.11` or
//! `6.0.0.0-0`. Anything after a `-` is a packaging suffix and is ignored.

use std::cmp::Ordering;
use std::fmt;

/// Numeric build version used for feature gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BuildVersion {
    parts: [u32; 4],
}

impl BuildVersion {
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self {
            parts: [major, minor, patch, build],
        }
    }

    /// Parse a build string; missing components count as zero
    pub fn parse(s: &str) -> Option<Self> {
        let core = s.trim().split('-').next()?;
        if core.is_empty() {
            return None;
        }

        let mut parts = [0u32; 4];
        for (i, piece) in core.split('.').enumerate() {
            if i >= parts.len() {
                break;
            }
            parts[i] = piece.parse().ok()?;
        }
        Some(Self { parts })
    }

    /// True if this build is at least `other`
    pub fn at_least(&self, other: &BuildVersion) -> bool {
        self >= other
    }
}

impl PartialOrd for BuildVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BuildVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.parts;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        assert_eq!(BuildVersion::parse("5.7.0.11"), Some(BuildVersion::new(5, 7, 0, 11)));
        assert_eq!(BuildVersion::parse("6.0.0.0-0"), Some(BuildVersion::new(6, 0, 0, 0)));
        assert_eq!(BuildVersion::parse("4.9"), Some(BuildVersion::new(4, 9, 0, 0)));
        assert_eq!(BuildVersion::parse(""), None);
        assert_eq!(BuildVersion::parse("ee-build"), None);
    }

    #[test]
    fn test_numeric_ordering() {
        let old = BuildVersion::parse("5.10.0.0").unwrap();
        let new = BuildVersion::parse("5.9.0.0").unwrap();
        assert!(old > new);
        assert!(BuildVersion::parse("6.0.0.0-0")
            .unwrap()
            .at_least(&BuildVersion::new(5, 7, 0, 0)));
        assert!(!BuildVersion::parse("5.6.0.4")
            .unwrap()
            .at_least(&BuildVersion::new(5, 7, 0, 0)));
    }
}

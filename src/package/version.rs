//! Version parsing and requirement matching for installed gems.
//!
//! Gem versions are looser than semver (`1.2`, `1.2.3.4`, `1.0.0.rc1`).
//! A [`GemVersion`] keeps the full list of numeric segments as its ordering
//! key, with the prerelease compared after it, and carries a normalized
//! [`semver::Version`] alongside: missing minor/patch segments become zero,
//! numeric segments past the third become build metadata, and the first
//! alphabetic segment starts the prerelease.

use anyhow::{Context, Result, bail};
use semver::{BuildMetadata, Prerelease, Version};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed gem version.
///
/// Ordering compares numeric segments first (so `1.2.3.4.rc1` > `1.2.3.3`),
/// then the prerelease, where a release sorts above any of its prereleases.
#[derive(Debug, Clone)]
pub struct GemVersion {
    /// At least three segments; zeros past the third are trimmed.
    segments: Vec<u64>,
    semver: Version,
}

impl GemVersion {
    fn from_parts(mut segments: Vec<u64>, pre: Prerelease) -> Result<Self> {
        segments.resize(segments.len().max(3), 0);
        // 1.2.3.0 == 1.2.3
        while segments.len() > 3 && segments.last() == Some(&0) {
            segments.pop();
        }

        let mut semver = Version::new(segments[0], segments[1], segments[2]);
        if segments.len() > 3 {
            let build = segments[3..]
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(".");
            semver.build = BuildMetadata::new(&build)?;
        }
        semver.pre = pre;

        Ok(Self { segments, semver })
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn as_semver(&self) -> &Version {
        &self.semver
    }

    pub fn pre(&self) -> &Prerelease {
        &self.semver.pre
    }

    pub fn is_prerelease(&self) -> bool {
        !self.semver.pre.is_empty()
    }
}

impl Ord for GemVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments
            .cmp(&other.segments)
            .then_with(|| self.semver.pre.cmp(&other.semver.pre))
    }
}

impl PartialOrd for GemVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GemVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GemVersion {}

impl fmt::Display for GemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numeric: Vec<String> = self.segments.iter().map(u64::to_string).collect();
        write!(f, "{}", numeric.join("."))?;
        if self.is_prerelease() {
            write!(f, ".{}", self.semver.pre)?;
        }
        Ok(())
    }
}

/// Parse a gem version string.
///
/// Accepts an optional leading `v`, and `.` or `-` as segment separators.
pub fn parse_version(input: &str) -> Result<GemVersion> {
    Ok(parse_segments(input)?.0)
}

/// Parse a version and also return the numeric segments exactly as written.
/// They drive the upper bound of the pessimistic (`~>`) operator.
fn parse_segments(input: &str) -> Result<(GemVersion, Vec<u64>)> {
    let trimmed = input.trim();
    let raw = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if raw.is_empty() {
        bail!("Empty version string");
    }

    let mut numeric: Vec<u64> = Vec::new();
    let mut pre: Vec<String> = Vec::new();

    for segment in raw.split(['.', '-']) {
        if segment.is_empty() {
            bail!("Invalid version '{}': empty segment", input);
        }

        if pre.is_empty() && segment.starts_with(|c: char| c.is_ascii_digit()) {
            // "0rc1" splits into 0 and "rc1"
            let split = segment
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(segment.len());
            let (digits, rest) = segment.split_at(split);
            let number = digits
                .parse::<u64>()
                .with_context(|| format!("Invalid version '{}': segment too large", input))?;
            numeric.push(number);
            if !rest.is_empty() {
                pre.push(rest.to_string());
            }
        } else if let Ok(number) = segment.parse::<u64>() {
            // Numeric identifiers must not carry leading zeros.
            pre.push(number.to_string());
        } else {
            pre.push(segment.to_string());
        }
    }

    if numeric.is_empty() {
        bail!("Invalid version '{}': must start with a number", input);
    }

    let pre = if pre.is_empty() {
        Prerelease::EMPTY
    } else {
        Prerelease::new(&pre.join("."))
            .with_context(|| format!("Invalid prerelease in version '{}'", input))?
    };

    let version = GemVersion::from_parts(numeric.clone(), pre)
        .with_context(|| format!("Invalid version '{}'", input))?;
    Ok((version, numeric))
}

/// Comparison operator of a single requirement clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    /// `~>`: at least the given version, below the next release of its
    /// second-to-last segment.
    Pessimistic,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::NotEq => "!=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::GtEq => ">=",
            Op::LtEq => "<=",
            Op::Pessimistic => "~>",
        }
    }

    /// Split a leading operator off a clause. Longer operators are tried first.
    fn split(clause: &str) -> (Op, &str) {
        const OPS: [(&str, Op); 7] = [
            ("~>", Op::Pessimistic),
            (">=", Op::GtEq),
            ("<=", Op::LtEq),
            ("!=", Op::NotEq),
            ("=", Op::Eq),
            (">", Op::Gt),
            ("<", Op::Lt),
        ];
        for (token, op) in OPS {
            if let Some(rest) = clause.strip_prefix(token) {
                return (op, rest);
            }
        }
        (Op::Eq, clause)
    }
}

/// One `<op> <version>` clause of a [`Requirement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Op,
    pub version: GemVersion,
    /// Exclusive upper bound, only set for [`Op::Pessimistic`].
    upper: Option<GemVersion>,
    /// Version text as written, for display.
    raw: String,
}

impl Comparator {
    fn parse(clause: &str) -> Result<Self> {
        let clause = clause.trim();
        if clause.is_empty() {
            bail!("Empty version requirement clause");
        }

        let (op, rest) = Op::split(clause);
        let raw = rest.trim();
        if raw.is_empty() {
            bail!("Missing version in requirement '{}'", clause);
        }
        if raw.starts_with(['=', '<', '>', '!', '~']) {
            bail!("Unknown operator in requirement '{}'", clause);
        }

        let (version, segments) = parse_segments(raw)
            .with_context(|| format!("Invalid version requirement '{}'", clause))?;

        let upper = if op == Op::Pessimistic {
            Some(
                pessimistic_upper(segments)
                    .with_context(|| format!("Invalid version requirement '{}'", clause))?,
            )
        } else {
            None
        };

        Ok(Self {
            op,
            version,
            upper,
            raw: raw.to_string(),
        })
    }

    pub fn matches(&self, version: &GemVersion) -> bool {
        match self.op {
            Op::Eq => version == &self.version,
            Op::NotEq => version != &self.version,
            Op::Gt => version > &self.version,
            Op::Lt => version < &self.version,
            Op::GtEq => version >= &self.version,
            Op::LtEq => version <= &self.version,
            Op::Pessimistic => {
                version >= &self.version
                    && self.upper.as_ref().is_none_or(|upper| version < upper)
            }
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.as_str(), self.raw)
    }
}

/// Drop the last written segment and bump the one before it:
/// `~> 1.2` stays below 2, `~> 1.2.3` below 1.3, `~> 1.2.3.4.5` below 1.2.3.5.
/// A single segment is bumped directly (`~> 1` stays below 2).
fn pessimistic_upper(mut segments: Vec<u64>) -> Result<GemVersion> {
    if segments.len() > 1 {
        segments.pop();
    }
    if let Some(last) = segments.last_mut() {
        *last = last.checked_add(1).context("Version segment overflow")?;
    }
    GemVersion::from_parts(segments, Prerelease::EMPTY)
}

/// A conjunction of version clauses, e.g. `>= 1.2, < 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    comparators: Vec<Comparator>,
}

impl Default for Requirement {
    /// `>= 0`: any released version.
    fn default() -> Self {
        Self {
            comparators: vec![Comparator {
                op: Op::GtEq,
                version: GemVersion {
                    segments: vec![0, 0, 0],
                    semver: Version::new(0, 0, 0),
                },
                upper: None,
                raw: "0".to_string(),
            }],
        }
    }
}

impl Requirement {
    /// Parse comma-separated clauses. Whitespace around operators is optional.
    pub fn parse(input: &str) -> Result<Self> {
        let comparators = input
            .split(',')
            .map(Comparator::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { comparators })
    }

    /// Combine several requirement strings (e.g. repeated `-v` flags) into one.
    /// No input yields the default requirement.
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Self> {
        if inputs.is_empty() {
            return Ok(Self::default());
        }
        let mut comparators = Vec::new();
        for input in inputs {
            comparators.extend(Self::parse(input.as_ref())?.comparators);
        }
        Ok(Self { comparators })
    }

    pub fn comparators(&self) -> &[Comparator] {
        &self.comparators
    }

    /// Check whether `version` satisfies every clause.
    ///
    /// Prerelease versions only match when `allow_prerelease` is set, or when
    /// a clause itself names a prerelease of the same release segments.
    pub fn matches(&self, version: &GemVersion, allow_prerelease: bool) -> bool {
        if version.is_prerelease() && !allow_prerelease && !self.names_prerelease_of(version) {
            return false;
        }
        self.comparators.iter().all(|c| c.matches(version))
    }

    fn names_prerelease_of(&self, version: &GemVersion) -> bool {
        self.comparators
            .iter()
            .any(|c| c.version.is_prerelease() && c.version.segments() == version.segments())
    }
}

impl FromStr for Requirement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self.comparators.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", clauses.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> GemVersion {
        parse_version(s).unwrap()
    }

    fn req(s: &str) -> Requirement {
        Requirement::parse(s).unwrap()
    }

    #[test]
    fn test_parse_version_full() {
        assert_eq!(v("1.2.3").as_semver(), &Version::new(1, 2, 3));
        assert_eq!(v("1.2.3").segments(), &[1, 2, 3]);
    }

    #[test]
    fn test_parse_version_pads_missing_segments() {
        assert_eq!(v("2").as_semver(), &Version::new(2, 0, 0));
        assert_eq!(v("1.2").as_semver(), &Version::new(1, 2, 0));
        assert_eq!(v("1.2"), v("1.2.0"));
    }

    #[test]
    fn test_parse_version_with_v_prefix() {
        assert_eq!(v("v1.0.0").as_semver(), &Version::new(1, 0, 0));
    }

    #[test]
    fn test_parse_version_extra_segments() {
        let version = v("1.2.3.4");
        let semver = version.as_semver();
        assert_eq!((semver.major, semver.minor, semver.patch), (1, 2, 3));
        assert_eq!(semver.build.as_str(), "4");
        assert_eq!(version.segments(), &[1, 2, 3, 4]);

        // Trailing zeros past the third segment are insignificant
        assert_eq!(v("1.2.3.0"), v("1.2.3"));
        assert!(v("1.2.3.1") > v("1.2.3"));
        assert!(v("1.2.3.10") > v("1.2.3.9"));
    }

    #[test]
    fn test_extra_segments_order_before_prerelease() {
        let pre = v("1.2.3.4.rc1");
        assert_eq!(pre.segments(), &[1, 2, 3, 4]);
        assert_eq!(pre.pre().as_str(), "rc1");

        assert!(pre > v("1.2.3.3"));
        assert!(pre > v("1.2.3"));
        assert!(pre < v("1.2.3.4"));
        assert_eq!(pre.to_string(), "1.2.3.4.rc1");
    }

    #[test]
    fn test_parse_version_prerelease_forms() {
        assert_eq!(v("1.0.0.rc1").pre().as_str(), "rc1");
        assert_eq!(v("1.0.0-rc1").pre().as_str(), "rc1");
        assert_eq!(v("2.0.0.pre.2").pre().as_str(), "pre.2");
        assert_eq!(v("1.0rc1"), v("1.0.0.rc1"));
        assert!(v("1.0.0.rc1") < v("1.0.0"));
    }

    #[test]
    fn test_parse_version_invalid() {
        assert!(parse_version("").is_err());
        assert!(parse_version("v").is_err());
        assert!(parse_version("abc").is_err());
        assert!(parse_version("1..2").is_err());
        assert!(parse_version("1.x_y").is_err());
    }

    #[test]
    fn test_default_requirement_matches_any_release() {
        let requirement = Requirement::default();
        assert_eq!(requirement.to_string(), ">= 0");
        assert!(requirement.matches(&v("0.0.1"), false));
        assert!(requirement.matches(&v("13.0.6"), false));
        assert!(!requirement.matches(&v("14.0.0.beta1"), false));
        assert!(requirement.matches(&v("14.0.0.beta1"), true));
    }

    #[test]
    fn test_requirement_operators() {
        assert!(req("= 1.2.3").matches(&v("1.2.3"), false));
        assert!(!req("= 1.2.3").matches(&v("1.2.4"), false));
        assert!(req("1.2.3").matches(&v("1.2.3"), false));
        assert!(req("!= 1.2.3").matches(&v("1.2.4"), false));
        assert!(!req("!= 1.2.3").matches(&v("1.2.3"), false));
        assert!(req("> 1.0").matches(&v("1.0.1"), false));
        assert!(!req("> 1.0").matches(&v("1.0.0"), false));
        assert!(req("< 2").matches(&v("1.9.9"), false));
        assert!(req(">= 1.2.0").matches(&v("1.2.0"), false));
        assert!(req("<= 1.2.0").matches(&v("1.2.0"), false));
        assert!(!req("<= 1.2.0").matches(&v("1.2.1"), false));
    }

    #[test]
    fn test_requirement_without_spaces() {
        assert_eq!(req(">=1.2"), req(">= 1.2"));
        assert!(req("~>2.1").matches(&v("2.5"), false));
    }

    #[test]
    fn test_pessimistic_two_segments() {
        let requirement = req("~> 1.2");
        assert!(requirement.matches(&v("1.2.0"), false));
        assert!(requirement.matches(&v("1.9.9"), false));
        assert!(!requirement.matches(&v("2.0.0"), false));
        assert!(!requirement.matches(&v("1.1.9"), false));
    }

    #[test]
    fn test_pessimistic_three_segments() {
        let requirement = req("~> 1.2.3");
        assert!(requirement.matches(&v("1.2.3"), false));
        assert!(requirement.matches(&v("1.2.10"), false));
        assert!(!requirement.matches(&v("1.3.0"), false));
    }

    #[test]
    fn test_pessimistic_single_and_four_segments() {
        assert!(req("~> 1").matches(&v("1.9"), false));
        assert!(!req("~> 1").matches(&v("2.0"), false));

        let requirement = req("~> 1.2.3.4");
        assert!(requirement.matches(&v("1.2.3.9"), false));
        assert!(!requirement.matches(&v("1.2.4"), false));
    }

    #[test]
    fn test_pessimistic_many_segments() {
        let requirement = req("~> 1.2.3.4.5");
        assert!(requirement.matches(&v("1.2.3.4.5"), false));
        assert!(requirement.matches(&v("1.2.3.4.9"), false));
        assert!(!requirement.matches(&v("1.2.3.5"), false));
        assert!(!requirement.matches(&v("1.2.3.6"), false));
    }

    #[test]
    fn test_pessimistic_trailing_zero_segment() {
        let requirement = req("~> 1.2.3.0");
        assert!(requirement.matches(&v("1.2.3.7"), false));
        assert!(!requirement.matches(&v("1.2.4"), false));
    }

    #[test]
    fn test_compound_requirement() {
        let requirement = req(">= 1.0, < 1.5");
        assert_eq!(requirement.comparators().len(), 2);
        assert!(requirement.matches(&v("1.4.9"), false));
        assert!(!requirement.matches(&v("1.5.0"), false));
        assert_eq!(requirement.to_string(), ">= 1.0, < 1.5");
    }

    #[test]
    fn test_parse_all_combines_flags() {
        let requirement = Requirement::parse_all(&[">= 1.0", "!= 1.2.0"]).unwrap();
        assert!(requirement.matches(&v("1.1.0"), false));
        assert!(!requirement.matches(&v("1.2.0"), false));

        let empty: [&str; 0] = [];
        assert_eq!(Requirement::parse_all(&empty).unwrap(), Requirement::default());
    }

    #[test]
    fn test_explicit_prerelease_requirement() {
        let requirement = req("= 2.0.0.rc1");
        assert!(requirement.matches(&v("2.0.0.rc1"), false));

        let requirement = req(">= 2.0.0.rc1");
        assert!(requirement.matches(&v("2.0.0.rc2"), false));
        // Prereleases of other versions still need opting in
        assert!(!requirement.matches(&v("2.1.0.beta"), false));
        assert!(requirement.matches(&v("2.1.0.beta"), true));
    }

    #[test]
    fn test_prerelease_with_extra_segments_names_its_own_release() {
        let requirement = req("= 1.2.3.4.rc1");
        assert!(requirement.matches(&v("1.2.3.4.rc1"), false));

        // Not a prerelease of 1.2.3
        let requirement = req(">= 1.2.3.4.rc1");
        assert!(!requirement.matches(&v("1.2.3.5.beta"), false));
        assert!(requirement.matches(&v("1.2.3.4.rc2"), false));
    }

    #[test]
    fn test_requirement_parse_errors() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse(">= 1.0,").is_err());
        assert!(Requirement::parse(">=").is_err());
        assert!(Requirement::parse("=> 1.0").is_err());
        assert!(Requirement::parse("<> 1.0").is_err());
        assert!(Requirement::parse(">= abc").is_err());
    }

    #[test]
    fn test_requirement_from_str() {
        let requirement: Requirement = "~> 3.0".parse().unwrap();
        assert_eq!(requirement.to_string(), "~> 3.0");
    }
}

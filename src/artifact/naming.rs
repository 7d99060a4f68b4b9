//! APK file naming schemes
//!
//! Extracts a sortable version and a display label from an artifact basename.
//! Three schemes are tried in order, first match wins:
//!
//! - Numbered build: `wire-v4.21.0-73937-prod-release.apk` -> (4, 21, 0, 73937), label `4.21.0-73937`
//! - Tagged variant: `wire-v4.21.0-fdroid.apk` -> (4, 21, 0, 0), label `4.21.0`
//! - Bare version: `wire-v4.21.0.apk` -> (4, 21, 0, 0), label `4.21.0`

use regex::{Captures, Regex};

/// Variant tag recognized when no tags are configured
pub const DEFAULT_VARIANT_TAG: &str = "fdroid";

/// Ordering key extracted from an artifact basename
///
/// Field order matters: the derived `Ord` compares major, minor, patch, then build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub build: u64,
}

impl ParsedVersion {
    pub fn new(major: u64, minor: u64, patch: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }
}

impl std::fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}+{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

/// Which naming scheme matched a basename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    /// `-v1.2.3-45`
    NumberedBuild,
    /// `-v1.2.3-fdroid`
    TaggedVariant,
    /// `-v1.2.3.apk`
    BareVersion,
}

impl NamingScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingScheme::NumberedBuild => "numbered_build",
            NamingScheme::TaggedVariant => "tagged_variant",
            NamingScheme::BareVersion => "bare_version",
        }
    }
}

/// Compiled naming patterns
pub struct ArtifactNaming {
    /// Regex for `-v1.2.3-45` followed by `-`, `.` or end of name
    numbered_re: Regex,
    /// Regex for `-v1.2.3-<tag>`, absent when no tags are configured
    tagged_re: Option<Regex>,
    /// Regex for `-v1.2.3` right before the extension
    bare_re: Regex,
}

impl ArtifactNaming {
    pub fn new() -> Self {
        Self::with_tagged(Some(tagged_regex(&[DEFAULT_VARIANT_TAG]).unwrap()))
    }

    /// Build the patterns with a custom set of variant tags.
    ///
    /// Tags are matched literally and case-insensitively. An empty list
    /// disables the tagged-variant scheme.
    pub fn with_variant_tags<S: AsRef<str>>(tags: &[S]) -> Result<Self, regex::Error> {
        let tags: Vec<&str> = tags
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .collect();

        let tagged_re = if tags.is_empty() {
            None
        } else {
            Some(tagged_regex(&tags)?)
        };

        Ok(Self::with_tagged(tagged_re))
    }

    fn with_tagged(tagged_re: Option<Regex>) -> Self {
        Self {
            numbered_re: Regex::new(
                r"-v(?P<label>(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)-(?P<build>\d+))(?:[-.]|$)",
            )
            .unwrap(),
            tagged_re,
            bare_re: Regex::new(
                r"(?i)-v(?P<label>(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+))(?:\.apk)?$",
            )
            .unwrap(),
        }
    }

    /// Parse the ordering key from a basename
    pub fn parse(&self, basename: &str) -> Option<ParsedVersion> {
        let (scheme, caps) = self.find(basename)?;
        let number = |name: &str| caps.name(name)?.as_str().parse::<u64>().ok();

        let build = match scheme {
            NamingScheme::NumberedBuild => number("build")?,
            NamingScheme::TaggedVariant | NamingScheme::BareVersion => 0,
        };

        Some(ParsedVersion::new(
            number("major")?,
            number("minor")?,
            number("patch")?,
            build,
        ))
    }

    /// Extract the human-readable version text, e.g. `4.21.0-73937` or `4.21.0`
    pub fn label(&self, basename: &str) -> Option<String> {
        let (_, caps) = self.find(basename)?;
        caps.name("label").map(|m| m.as_str().to_string())
    }

    /// Return the scheme a basename is named under, if any
    pub fn scheme(&self, basename: &str) -> Option<NamingScheme> {
        self.find(basename).map(|(scheme, _)| scheme)
    }

    fn find<'h>(&self, basename: &'h str) -> Option<(NamingScheme, Captures<'h>)> {
        if let Some(caps) = self.numbered_re.captures(basename) {
            return Some((NamingScheme::NumberedBuild, caps));
        }
        if let Some(caps) = self
            .tagged_re
            .as_ref()
            .and_then(|re| re.captures(basename))
        {
            return Some((NamingScheme::TaggedVariant, caps));
        }
        self.bare_re
            .captures(basename)
            .map(|caps| (NamingScheme::BareVersion, caps))
    }
}

impl Default for ArtifactNaming {
    fn default() -> Self {
        Self::new()
    }
}

fn tagged_regex<S: AsRef<str>>(tags: &[S]) -> Result<Regex, regex::Error> {
    let alternatives = tags
        .iter()
        .map(|t| regex::escape(t.as_ref()))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(
        r"(?i)-v(?P<label>(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+))-(?:{alternatives})(?:[-.]|$)"
    ))
}

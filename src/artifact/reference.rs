//! Classification of user-supplied build references
//!
//! A reference names the artifact to select in one of four ways:
//! - `s3://bucket/android/builds/wire.apk` or `builds/wire.apk`: exact identifier
//! - `wire-v4.21.0-73937.apk`: file name, matched against basenames
//! - `latest`: highest parsed version
//! - anything else (e.g. `73937`): free-text token, matched as a basename substring

use crate::artifact::candidate::has_artifact_extension;

/// Literal selecting the highest parsed version
pub const LATEST: &str = "latest";

/// Remote storage scheme stripped together with the bucket and the first key segment
const REMOTE_SCHEME: &str = "s3://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Full identifier, used verbatim
    ExactPath(String),
    /// Bare file name ending in the artifact extension
    FileName(String),
    /// Highest parsed version
    Latest,
    /// Free-text basename substring
    Token(String),
}

impl Reference {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if has_artifact_extension(raw) {
            let normalized = normalize_path(raw);
            if normalized.contains('/') {
                Reference::ExactPath(normalized.to_string())
            } else {
                Reference::FileName(normalized.to_string())
            }
        } else if raw == LATEST {
            Reference::Latest
        } else {
            Reference::Token(raw.to_string())
        }
    }

    /// Parse an optional reference, treating blank input as absent
    pub fn parse_optional(raw: Option<&str>) -> Option<Self> {
        raw.filter(|r| !r.trim().is_empty()).map(Self::parse)
    }

    /// Returns true for free-text tokens
    pub fn is_token(&self) -> bool {
        matches!(self, Reference::Token(_))
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::ExactPath(s) | Reference::FileName(s) | Reference::Token(s) => {
                f.write_str(s)
            }
            Reference::Latest => f.write_str(LATEST),
        }
    }
}

/// Strip `s3://<bucket>/<segment>/` if present, otherwise one leading `/`
fn normalize_path(raw: &str) -> &str {
    if let Some(rest) = raw.strip_prefix(REMOTE_SCHEME) {
        let mut segments = rest.splitn(3, '/');
        if let (Some(_bucket), Some(_segment), Some(key)) =
            (segments.next(), segments.next(), segments.next())
        {
            return key;
        }
        return rest;
    }
    raw.strip_prefix('/').unwrap_or(raw)
}

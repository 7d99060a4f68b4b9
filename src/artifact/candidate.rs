//! Listed artifacts eligible for selection

/// File extension of a recognized artifact (compared case-insensitively)
pub const ARTIFACT_EXTENSION: &str = ".apk";

/// A listed artifact identifier, e.g. `android/builds/wire-v4.21.0-73937.apk`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Full identifier as listed
    pub name: String,
    /// Part after the last `/`
    pub basename: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let basename = basename(&name).to_string();
        Self { name, basename }
    }

    /// Keep only names carrying the artifact extension, preserving order
    pub fn filter_artifacts<I, S>(names: I) -> Vec<Candidate>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(Into::into)
            .filter(|name| has_artifact_extension(name))
            .map(Candidate::new)
            .collect()
    }
}

/// Returns true if `name` ends with [`ARTIFACT_EXTENSION`], ignoring case
pub fn has_artifact_extension(name: &str) -> bool {
    let ext_len = ARTIFACT_EXTENSION.len();
    name.len() >= ext_len
        && name
            .get(name.len() - ext_len..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
}

/// Substring after the last `/`, or the whole name
pub fn basename(name: &str) -> &str {
    name.rsplit_once('/').map_or(name, |(_, base)| base)
}

//! Artifact version resolution
//!
//! Resolves the "new" and, in upgrade mode, the "old" artifact from a listing.
//! Parsed candidates are stably sorted by [`ParsedVersion`], so among equal
//! versions the one listed later counts as newer.

use tracing::{debug, info, warn};

use crate::artifact::candidate::Candidate;
use crate::artifact::error::SelectError;
use crate::artifact::naming::{ArtifactNaming, ParsedVersion};
use crate::artifact::reference::Reference;

/// Text used in errors when the implicit old reference cannot be resolved
pub const SECOND_LATEST: &str = "second latest";

/// Selection parameters for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    /// New build reference: path, file name, `latest`, or free-text token
    pub target: String,
    /// Resolve an old build as well
    pub upgrade: bool,
    /// Old build reference; blank means the second latest version
    pub old_reference: Option<String>,
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self {
            target: crate::artifact::reference::LATEST.to_string(),
            upgrade: false,
            old_reference: None,
        }
    }
}

/// Resolved artifacts and their version labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    pub new: Candidate,
    /// Present iff upgrade mode was requested
    pub old: Option<Candidate>,
    pub new_label: String,
    /// Empty when `old` is absent or carries no version
    pub old_label: String,
}

pub struct ArtifactResolver {
    naming: ArtifactNaming,
    candidates: Vec<Candidate>,
    /// `(version, index into candidates)`, ascending by version
    ordered: Vec<(ParsedVersion, usize)>,
    strict_paths: bool,
}

impl ArtifactResolver {
    /// Build a resolver over listed names; names without the artifact extension are dropped
    pub fn new<I, S>(names: I, naming: ArtifactNaming) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = Candidate::filter_artifacts(names);

        let mut ordered: Vec<(ParsedVersion, usize)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| match naming.parse(&candidate.basename) {
                Some(version) => {
                    debug!("Parsed {} as {}", candidate.basename, version);
                    Some((version, index))
                }
                None => {
                    debug!("No version in {}", candidate.basename);
                    None
                }
            })
            .collect();
        // sort_by_key is stable
        ordered.sort_by_key(|(version, _)| *version);

        if !candidates.is_empty() && ordered.is_empty() {
            warn!(
                "None of the {} candidates matches a known naming scheme",
                candidates.len()
            );
        }

        Self {
            naming,
            candidates,
            ordered,
            strict_paths: false,
        }
    }

    /// Require exact path references to name a listed candidate
    pub fn strict_paths(mut self, strict: bool) -> Self {
        self.strict_paths = strict;
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn naming(&self) -> &ArtifactNaming {
        &self.naming
    }

    /// Parsed candidates in ascending version order
    pub fn ordered(&self) -> impl Iterator<Item = (&Candidate, ParsedVersion)> + '_ {
        self.ordered
            .iter()
            .map(|(version, index)| (&self.candidates[*index], *version))
    }

    pub fn latest(&self) -> Option<&Candidate> {
        self.ordered
            .last()
            .map(|(_, index)| &self.candidates[*index])
    }

    pub fn second_latest(&self) -> Option<&Candidate> {
        let len = self.ordered.len();
        if len < 2 {
            return None;
        }
        let (_, index) = self.ordered[len - 2];
        Some(&self.candidates[index])
    }

    /// Resolve a reference to a candidate
    ///
    /// Exact paths are returned verbatim (listed or not, unless strict);
    /// file names prefer an exact basename match over a substring match.
    pub fn resolve(&self, reference: &Reference) -> Option<Candidate> {
        match reference {
            Reference::ExactPath(path) => {
                if self.strict_paths && !self.candidates.iter().any(|c| &c.name == path) {
                    debug!("{} is not a listed candidate", path);
                    return None;
                }
                Some(Candidate::new(path.as_str()))
            }
            Reference::FileName(file_name) => self
                .candidates
                .iter()
                .find(|c| &c.basename == file_name)
                .or_else(|| self.find_containing(file_name))
                .cloned(),
            Reference::Latest => self.latest().cloned(),
            Reference::Token(token) => self.find_containing(token).cloned(),
        }
    }

    /// Version label of a candidate's basename, empty if it has none
    pub fn label(&self, candidate: &Candidate) -> String {
        self.naming.label(&candidate.basename).unwrap_or_default()
    }

    /// Resolve the new artifact and, in upgrade mode, the old one
    pub fn select(&self, request: &SelectionRequest) -> Result<SelectionResult, SelectError> {
        if self.candidates.is_empty() {
            return Err(SelectError::NoCandidates);
        }

        let new_reference = Reference::parse(&request.target);
        let old_reference = Reference::parse_optional(request.old_reference.as_deref());

        // A token names no particular version, so "the one before it" is undefined
        if request.upgrade && old_reference.is_none() && new_reference.is_token() {
            return Err(SelectError::OldReferenceRequired(new_reference.to_string()));
        }

        let new = self
            .resolve(&new_reference)
            .ok_or_else(|| SelectError::NewNotResolved(new_reference.to_string()))?;
        info!("Selected new build {}", new.name);

        let old = if request.upgrade {
            let old = match &old_reference {
                Some(reference) => self
                    .resolve(reference)
                    .ok_or_else(|| SelectError::OldNotResolved(reference.to_string()))?,
                None => self
                    .second_latest()
                    .cloned()
                    .ok_or_else(|| SelectError::OldNotResolved(SECOND_LATEST.to_string()))?,
            };
            info!("Selected old build {}", old.name);
            Some(old)
        } else {
            None
        };

        Ok(SelectionResult {
            new_label: self.label(&new),
            old_label: old.as_ref().map(|c| self.label(c)).unwrap_or_default(),
            new,
            old,
        })
    }

    /// First candidate, in listing order, whose basename contains `needle`
    fn find_containing(&self, needle: &str) -> Option<&Candidate> {
        if needle.is_empty() {
            return None;
        }
        self.candidates.iter().find(|c| c.basename.contains(needle))
    }
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("No .apk artifacts found among the listed candidates")]
    NoCandidates,

    #[error("Could not resolve new build reference '{0}' to an artifact")]
    NewNotResolved(String),

    #[error("Could not resolve old build reference '{0}' to an artifact")]
    OldNotResolved(String),

    #[error("Upgrade mode with build token '{0}' requires an explicit old build reference")]
    OldReferenceRequired(String),
}

impl SelectError {
    /// Process exit status for this error kind
    pub fn exit_code(&self) -> u8 {
        match self {
            SelectError::NoCandidates => 2,
            SelectError::NewNotResolved(_) => 3,
            SelectError::OldNotResolved(_) => 4,
            SelectError::OldReferenceRequired(_) => 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read candidate list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in candidate list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Candidate list must be a JSON array of strings: {0}")]
    InvalidShape(String),
}

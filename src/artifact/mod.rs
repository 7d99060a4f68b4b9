//! APK artifact selection
//!
//! Picks the build under test (and, for upgrade tests, the build to upgrade
//! from) out of a listing of artifact identifiers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│  Resolver   │◀────│  Reference  │
//! │  (listing)  │     │  (select)   │     │ (classify)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │   Naming    │
//!                     │(version/tag)│
//!                     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`candidate`]: Listed artifact identifiers and extension filtering
//! - [`error`]: Error types for selection and listing input
//! - [`naming`]: File naming schemes, version parsing and labels
//! - [`reference`]: Classification of build references
//! - [`resolver`]: Version ordering and new/old resolution
//! - [`source`]: Reading candidate listings from JSON or line lists

pub mod candidate;
pub mod error;
pub mod naming;
pub mod reference;
pub mod resolver;
pub mod source;

use tracing::debug;

use crate::artifact::error::SourceError;
use crate::artifact::naming::ArtifactNaming;
use crate::artifact::resolver::ArtifactResolver;
use crate::artifact::source::CandidateSource;

/// Load a listing and build a resolver over it
pub fn load_resolver<S: CandidateSource + ?Sized>(
    source: &S,
    naming: ArtifactNaming,
) -> Result<ArtifactResolver, SourceError> {
    let names = source.load()?;
    let listed = names.len();
    let resolver = ArtifactResolver::new(names, naming);
    debug!(
        "Loaded {} listed entries, {} artifacts",
        listed,
        resolver.candidates().len()
    );
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::error::SourceError;
    use crate::artifact::source::MockCandidateSource;

    #[test]
    fn load_resolver_filters_listing() {
        let mut source = MockCandidateSource::new();
        source.expect_load().times(1).returning(|| {
            Ok(vec![
                "b/wire-v1.0.0-1.apk".to_string(),
                "b/wire-v1.0.0-1.apk.sha256".to_string(),
                "b/wire-v1.0.1-2.apk".to_string(),
            ])
        });

        let resolver = load_resolver(&source, ArtifactNaming::new()).unwrap();

        assert_eq!(resolver.candidates().len(), 2);
        assert_eq!(resolver.latest().unwrap().name, "b/wire-v1.0.1-2.apk");
    }

    #[test]
    fn load_resolver_propagates_source_error() {
        let mut source = MockCandidateSource::new();
        source
            .expect_load()
            .returning(|| Err(SourceError::InvalidShape("expected an array".to_string())));

        assert!(matches!(
            load_resolver(&source, ArtifactNaming::new()),
            Err(SourceError::InvalidShape(_))
        ));
    }
}

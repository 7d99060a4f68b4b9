use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::artifact::naming::{ArtifactNaming, DEFAULT_VARIANT_TAG};
use crate::artifact::reference::LATEST;
use crate::artifact::resolver::SelectionRequest;

// =============================================================================
// Environment variables
// =============================================================================

/// New build reference
pub const ENV_NEW_REF: &str = "APK_NEW_REF";

/// Upgrade mode flag
pub const ENV_UPGRADE: &str = "APK_UPGRADE";

/// Old build reference
pub const ENV_OLD_REF: &str = "APK_OLD_REF";

/// Comma-separated variant tags
pub const ENV_VARIANT_TAGS: &str = "APK_VARIANT_TAGS";

/// Require exact path references to be listed
pub const ENV_STRICT_PATHS: &str = "APK_STRICT_PATHS";

/// Candidate listing file
pub const ENV_CANDIDATES: &str = "APK_CANDIDATES";

/// Output file for `key=value` lines
pub const ENV_OUTPUT: &str = "GITHUB_OUTPUT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Selection configuration, built once at the process boundary
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionConfig {
    /// New build reference
    pub target: String,
    pub upgrade: bool,
    /// Old build reference, blank for the second latest version
    pub old_reference: Option<String>,
    /// Non-numeric suffixes accepted after the version, e.g. `fdroid`
    pub variant_tags: Vec<String>,
    /// Require exact path references to name a listed candidate
    pub strict_paths: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            target: LATEST.to_string(),
            upgrade: false,
            old_reference: None,
            variant_tags: vec![DEFAULT_VARIANT_TAG.to_string()],
            strict_paths: false,
        }
    }
}

impl SelectionConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn request(&self) -> SelectionRequest {
        SelectionRequest {
            target: self.target.clone(),
            upgrade: self.upgrade,
            old_reference: self.old_reference.clone(),
        }
    }

    pub fn naming(&self) -> Result<ArtifactNaming, regex::Error> {
        ArtifactNaming::with_variant_tags(self.variant_tags.as_slice())
    }
}

/// Split a comma-separated tag list, dropping blanks
pub fn parse_variant_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::naming::ParsedVersion;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn selection_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<SelectionConfig>(json!({
            "upgrade": true,
            "oldReference": "4.20.1"
        }))
        .unwrap();

        assert_eq!(
            result,
            SelectionConfig {
                upgrade: true,
                old_reference: Some("4.20.1".to_string()),
                ..SelectionConfig::default()
            }
        );
    }

    #[test]
    fn selection_config_rejects_non_string_tags() {
        let result = serde_json::from_value::<SelectionConfig>(json!({
            "variantTags": ["fdroid", 1]
        }));

        assert!(result.is_err());
    }

    #[test]
    fn from_file_reads_json_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("select.json");
        std::fs::write(&path, r#"{"target": "73937", "variantTags": []}"#).unwrap();

        let config = SelectionConfig::from_file(&path).unwrap();

        assert_eq!(config.target, "73937");
        assert!(config.variant_tags.is_empty());
        assert!(!config.upgrade);
    }

    #[test]
    fn from_file_reports_invalid_json() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("select.json");
        std::fs::write(&path, "{").unwrap();

        assert!(matches!(
            SelectionConfig::from_file(&path),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn request_carries_selection_fields() {
        let config = SelectionConfig {
            target: "73937".to_string(),
            upgrade: true,
            old_reference: Some("73000".to_string()),
            ..SelectionConfig::default()
        };

        assert_eq!(
            config.request(),
            SelectionRequest {
                target: "73937".to_string(),
                upgrade: true,
                old_reference: Some("73000".to_string()),
            }
        );
    }

    #[test]
    fn naming_uses_configured_tags() {
        let config = SelectionConfig {
            variant_tags: vec!["huawei".to_string()],
            ..SelectionConfig::default()
        };

        let naming = config.naming().unwrap();

        assert_eq!(
            naming.parse("wire-v1.0.0-huawei.apk"),
            Some(ParsedVersion::new(1, 0, 0, 0))
        );
        assert_eq!(naming.parse("wire-v1.0.0-fdroid.apk"), None);
    }

    #[rstest]
    #[case("fdroid", vec!["fdroid"])]
    #[case("fdroid, huawei ,", vec!["fdroid", "huawei"])]
    #[case("", vec![])]
    fn parse_variant_tags_returns_expected(#[case] raw: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_variant_tags(raw), expected);
    }
}

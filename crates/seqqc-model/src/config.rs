//! Viewer configuration
//!
//! Passed explicitly to every component at construction. Can be built in
//! code with the `with_*` methods or loaded from a TOML file:
//!
//! ```toml
//! outcomes_url = "https://qc.example.org/qcoutcomes"
//! asset_root = "/static"
//! request_timeout_ms = 20000
//! lane_error_hint = "Contact qc-admins@example.org"
//! ```

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// QC viewer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    /// QC outcomes JSON service
    pub outcomes_url: String,
    /// Root of static assets (icons)
    pub asset_root: String,
    /// Summary table scanned for rpt keys
    pub summary_table_id: String,
    /// Status list receiving error lines
    pub status_region_id: String,
    /// Client request timeout; transport default when unset
    pub request_timeout_ms: Option<u64>,
    /// Hint appended to transport errors of lane-level updates
    pub lane_error_hint: Option<String>,
}

impl QcConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With outcomes service URL
    #[inline]
    #[must_use]
    pub fn with_outcomes_url(mut self, url: impl Into<String>) -> Self {
        self.outcomes_url = url.into();
        self
    }

    /// With static asset root
    #[inline]
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// With hint appended to lane-level transport errors
    #[inline]
    #[must_use]
    pub fn with_lane_error_hint(mut self, hint: impl Into<String>) -> Self {
        self.lane_error_hint = Some(hint.into());
        self
    }

    /// Request timeout, if configured
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// URL of an icon under `<asset_root>/images/`
    #[must_use]
    pub fn image_url(&self, name: &str) -> String {
        format!("{}/images/{name}", self.asset_root.trim_end_matches('/'))
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// `ModelError::Config` if a mandatory field is empty.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.outcomes_url.trim().is_empty() {
            return Err(ModelError::Config("outcomes_url must not be empty".into()));
        }
        if self.summary_table_id.trim().is_empty() {
            return Err(ModelError::Config("summary_table_id must not be empty".into()));
        }
        if self.status_region_id.trim().is_empty() {
            return Err(ModelError::Config("status_region_id must not be empty".into()));
        }
        Ok(())
    }

    /// Load from TOML text
    ///
    /// # Errors
    /// `ModelError::Config` for invalid TOML or an incomplete configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        let config: QcConfig =
            toml::from_str(text).map_err(|e| ModelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ModelError::Config` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            outcomes_url: "/qcoutcomes".to_string(),
            asset_root: "/static".to_string(),
            summary_table_id: "results_summary".to_string(),
            status_region_id: "ajax_status".to_string(),
            request_timeout_ms: None,
            lane_error_hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_viewer_layout() {
        let config = QcConfig::new();
        assert_eq!(config.outcomes_url, "/qcoutcomes");
        assert_eq!(config.image_url("tick.png"), "/static/images/tick.png");
        assert_eq!(config.request_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = QcConfig::new()
            .with_outcomes_url("http://localhost:8080/qcoutcomes")
            .with_asset_root("/assets/")
            .with_request_timeout(Duration::from_secs(2));
        assert_eq!(config.image_url("cross.png"), "/assets/images/cross.png");
        assert_eq!(config.request_timeout_ms, Some(2000));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = QcConfig::from_toml_str("outcomes_url = \"http://qc/qcoutcomes\"\n").unwrap();
        assert_eq!(config.outcomes_url, "http://qc/qcoutcomes");
        assert_eq!(config.summary_table_id, "results_summary");
    }

    #[test]
    fn empty_url_is_a_config_error() {
        let err = QcConfig::from_toml_str("outcomes_url = \"  \"").unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
        assert!(QcConfig::from_toml_str("outcomes_url = [").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "asset_root = \"/s\"\nlane_error_hint = \"mail qc\"").unwrap();
        let config = QcConfig::from_path(file.path()).unwrap();
        assert_eq!(config.asset_root, "/s");
        assert_eq!(config.lane_error_hint.as_deref(), Some("mail qc"));
        assert!(QcConfig::from_path("/nonexistent/seqqc.toml").is_err());
    }
}

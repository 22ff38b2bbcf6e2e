//! Persisted plugin settings.
//!
//! Settings are read from TOML. Every field has a default so a host only has
//! to write what it knows:
//!
//! ```toml
//! api_key = "0123456789abcdef"
//! site_url = "https://example.com/"
//! post_enabled = true
//! blog_public = true
//! date_format = "%d/%m/%Y"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::DEFAULT_API_BASE;
use crate::error::SettingsError;
use crate::http::DEFAULT_TIMEOUT;
use crate::sanitize::DEFAULT_DATE_FORMAT;

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "BING_WEBMASTER_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bing Webmaster API key. Surrounding whitespace is ignored.
    pub api_key: String,
    /// The site as registered in Bing Webmaster Tools.
    pub site_url: String,
    /// Submit posts to Bing when they are published.
    pub post_enabled: bool,
    /// Search engines are allowed to index the site.
    pub blog_public: bool,
    /// `strftime` pattern for dates shown to users.
    pub date_format: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            site_url: String::new(),
            post_enabled: false,
            blog_public: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Self::parse(content, "<inline>")
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        debug!(path = %path.display(), "loaded settings file");
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, origin: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings = toml::from_str(content).map_err(|e| SettingsError::Parse {
            path: origin.to_string(),
            source: e,
        })?;
        settings.api_key = settings.api_key.trim().to_string();
        Ok(settings)
    }

    /// Apply `BING_WEBMASTER_API_KEY` when it is set and not blank.
    pub fn with_env(self) -> Self {
        self.with_api_key_override(std::env::var(API_KEY_ENV).ok())
    }

    fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            debug!("api key taken from environment");
            self.api_key = key;
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Request timeout. Zero means unset and falls back to the default.
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.has_api_key());
        assert!(!settings.post_enabled);
        assert!(settings.blog_public);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn parses_all_fields_and_trims_key() {
        let settings = Settings::from_toml_str(
            r#"
            api_key = "  abc123  "
            site_url = "https://example.com/"
            post_enabled = true
            blog_public = false
            date_format = "%Y-%m-%d"
            api_base = "http://127.0.0.1:3000/webmaster/api.svc/json/"
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.api_key, "abc123");
        assert_eq!(settings.site_url, "https://example.com/");
        assert!(settings.post_enabled);
        assert!(!settings.blog_public);
        assert_eq!(settings.date_format, "%Y-%m-%d");
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn whitespace_key_counts_as_missing() {
        let settings = Settings::from_toml_str(r#"api_key = "   ""#).unwrap();
        assert!(!settings.has_api_key());
    }

    #[test]
    fn bad_toml_reports_parse_error() {
        let err = Settings::from_toml_str("post_enabled = maybe").unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let settings = Settings::from_toml_str("timeout_secs = 0").unwrap();
        assert_eq!(settings.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn load_reads_file_and_trims_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bing-webmaster.toml");
        std::fs::write(
            &path,
            "api_key = \"  file-key \"\nsite_url = \"https://example.com/\"\npost_enabled = true\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.api_key, "file-key");
        assert_eq!(settings.site_url, "https://example.com/");
        assert!(settings.post_enabled);
        assert_eq!(settings.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn load_reports_parse_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "post_enabled = \"sometimes\"\n").unwrap();

        match Settings::load(&path).unwrap_err() {
            SettingsError::Parse { path: origin, .. } => {
                assert_eq!(origin, path.display().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = Settings::load(Path::new("/nonexistent/bing-webmaster.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn override_replaces_key_unless_blank() {
        let base = Settings {
            api_key: "stored".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            base.clone().with_api_key_override(Some(" env ".into())).api_key,
            "env"
        );
        assert_eq!(
            base.clone().with_api_key_override(Some("  ".into())).api_key,
            "stored"
        );
        assert_eq!(base.with_api_key_override(None).api_key, "stored");
    }
}

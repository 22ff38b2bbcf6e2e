//! Error types for the Webmaster client and the service built on it.
//!
//! # Design
//! `ApiError` covers building and executing a single request. `ServiceError`
//! is what callers of the service see: four precondition failures that never
//! touch the network, plus the two network classes (the request failed vs.
//! the upstream answered with an `ErrorCode`). Its `Display` text is the
//! user-facing message.

use thiserror::Error;

/// Upstream documentation for the `ErrorCode` values returned by the API.
pub const ERROR_CODES_URL: &str =
    "https://docs.microsoft.com/en-us/previous-versions/bing/webmaster-api/hh969357(v%3dtechnet.10)";

/// Errors returned while building or executing a Webmaster API request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The operation name was empty after trimming.
    #[error("invalid operation: {0:?}")]
    InvalidOperation(String),

    /// The base URL and operation did not form a valid URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request parameters could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// No response was obtained. Carries the transport's own error text.
    #[error("{0}")]
    Transport(String),
}

/// Errors returned by `WebmasterService` operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Please save your Bing Webmaster API Key in Writing Settings page to use WordLift for Bing.")]
    NoKey,

    #[error("Waiting to publish post to start showing URL Traffic Info.")]
    NoUrl,

    #[error("Post to Bing disabled globally in Writing Settings page.")]
    NotEnabled,

    #[error("Search engines discouraged from indexing this site (Reading Settings page).")]
    NotPublic,

    /// The request could not be built or executed.
    #[error("Error in Bing Webmaster API request. {0}")]
    Request(String),

    /// The upstream answered with an `ErrorCode` payload.
    #[error("Error in Bing Webmaster API response. {message} ({code})")]
    Response { code: String, message: String },
}

impl ServiceError {
    /// Stable slug for the error, suitable for matching in host code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NoKey => "no-key",
            ServiceError::NoUrl => "no-url",
            ServiceError::NotEnabled => "not-enabled",
            ServiceError::NotPublic => "not-public",
            ServiceError::Request(_) => "bing-api-request",
            ServiceError::Response { .. } => "bing-api-response",
        }
    }

    /// True for the errors raised before any network call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ServiceError::NoKey
                | ServiceError::NoUrl
                | ServiceError::NotEnabled
                | ServiceError::NotPublic
        )
    }

    /// Link to the upstream error-code reference, for response errors only.
    pub fn help_url(&self) -> Option<&'static str> {
        match self {
            ServiceError::Response { .. } => Some(ERROR_CODES_URL),
            _ => None,
        }
    }
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        ServiceError::Request(err.to_string())
    }
}

/// Errors raised while loading `Settings`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_match_host_error_codes() {
        assert_eq!(ServiceError::NoKey.code(), "no-key");
        assert_eq!(ServiceError::NoUrl.code(), "no-url");
        assert_eq!(ServiceError::NotEnabled.code(), "not-enabled");
        assert_eq!(ServiceError::NotPublic.code(), "not-public");
        assert_eq!(ServiceError::Request("x".into()).code(), "bing-api-request");
    }

    #[test]
    fn response_error_carries_code_and_help_link() {
        let err = ServiceError::Response {
            code: "3".to_string(),
            message: "ERROR!!! InvalidApiKey".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error in Bing Webmaster API response. ERROR!!! InvalidApiKey (3)"
        );
        assert_eq!(err.help_url(), Some(ERROR_CODES_URL));
        assert!(!err.is_precondition());
    }

    #[test]
    fn transport_text_is_preserved_in_request_error() {
        let err: ServiceError = ApiError::Transport("connection refused".into()).into();
        assert_eq!(
            err.to_string(),
            "Error in Bing Webmaster API request. connection refused"
        );
        assert!(err.help_url().is_none());
    }
}

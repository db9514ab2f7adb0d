//! Dispatcher configuration and validation.
//!
//! # Design
//! - Every field has a default so partial documents are accepted.
//! - Validation reports the first offending field with a static reason.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default origin used to resolve relative targets.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
/// Default per-call timeout applied by the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Default capacity of the requestor → dispatcher channel.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;
/// Default capacity of the dispatcher → requestor channel.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

/// Structured errors emitted while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Static reason describing the failure.
        reason: &'static str,
    },
    /// The configuration document could not be parsed.
    #[error("failed to parse dispatch configuration")]
    Parse {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
}

/// Settings for the dispatcher task and its HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Origin (and optional path prefix) relative targets are resolved against.
    pub base_url: String,
    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,
    /// Capacity of the requestor → dispatcher channel.
    pub inbox_capacity: usize,
    /// Capacity of the dispatcher → requestor channel.
    pub outbox_capacity: usize,
    /// JSONP callback name; when set, responses are expected to be wrapped.
    pub jsonp_callback: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            jsonp_callback: None,
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON, contains unknown
    /// fields, or fails [`DispatchConfig::validate`].
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidField`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", None, "must be at least one second"));
        }
        if self.inbox_capacity == 0 {
            return Err(invalid("inbox_capacity", None, "must be greater than zero"));
        }
        if self.outbox_capacity == 0 {
            return Err(invalid("outbox_capacity", None, "must be greater than zero"));
        }
        if let Some(callback) = &self.jsonp_callback
            && !is_js_identifier(callback)
        {
            return Err(invalid(
                "jsonp_callback",
                Some(callback.clone()),
                "must be a JavaScript identifier",
            ));
        }
        Ok(())
    }

    /// Parse the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unparsable, not HTTP(S), or cannot carry a path.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|_| invalid("base_url", Some(self.base_url.clone()), "must be an absolute URL"))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(
                "base_url",
                Some(self.base_url.clone()),
                "must be an http or https URL",
            ));
        }
        Ok(url)
    }

    /// Per-call timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn invalid(field: &'static str, value: Option<String>, reason: &'static str) -> ConfigError {
    ConfigError::InvalidField {
        field,
        value,
        reason,
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

//! Outbound HTTP capability injected into the dispatcher.
//!
//! # Design
//! - The dispatcher depends only on the [`Transport`] trait; the `reqwest`
//!   adapter is one implementation and tests substitute scripted ones.
//! - Relative targets are joined onto the configured base URL, keeping any
//!   path prefix; absolute `http(s)` targets are used as-is.
//! - JSONP mode appends a `callback` query parameter and unwraps the
//!   `callback(...)` envelope before decoding.

use async_trait::async_trait;
use homedash_telemetry::current_request_id;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::config::{ConfigError, DispatchConfig};
use crate::descriptor::ResolvedTarget;
use crate::error::DispatchError;

const HEADER_REQUEST_ID: &str = "x-request-id";
const JSONP_QUERY_PARAM: &str = "callback";

/// Read-only structured fetch used by the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one GET-style call to `target` and decode a structured payload.
    async fn fetch(&self, target: &ResolvedTarget) -> Result<Value, DispatchError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    jsonp_callback: Option<String>,
}

impl HttpTransport {
    /// Wrap an existing client.
    #[must_use]
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            jsonp_callback: None,
        }
    }

    /// Expect callback-wrapped responses using `callback` as the wrapper name.
    #[must_use]
    pub fn with_jsonp_callback(mut self, callback: impl Into<String>) -> Self {
        self.jsonp_callback = Some(callback.into());
        self
    }

    /// Build a transport with a client configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the client cannot be built.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| ConfigError::ClientBuild { source })?;

        let transport = Self::new(client, config.base_url()?);
        Ok(match &config.jsonp_callback {
            Some(callback) => transport.with_jsonp_callback(callback.clone()),
            None => transport,
        })
    }

    /// Compute the absolute URL for `target`.
    #[must_use]
    pub fn endpoint(&self, target: &ResolvedTarget) -> Url {
        let mut url = match Url::parse(target.as_str()) {
            Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => absolute,
            _ => {
                let mut joined = self.base_url.clone();
                let prefix = self.base_url.path().trim_end_matches('/');
                let path = if target.as_str().starts_with('/') {
                    format!("{prefix}{target}")
                } else {
                    format!("{prefix}/{target}")
                };
                joined.set_path(&path);
                joined
            }
        };

        if let Some(callback) = &self.jsonp_callback {
            url.query_pairs_mut()
                .append_pair(JSONP_QUERY_PARAM, callback);
        }
        url
    }

    fn decode(&self, target: &str, body: &str) -> Result<Value, DispatchError> {
        let json = match &self.jsonp_callback {
            Some(callback) => {
                unwrap_jsonp(body, callback).ok_or_else(|| DispatchError::Malformed {
                    target: target.to_string(),
                    detail: format!("response is not wrapped in {callback}(...)"),
                })?
            }
            None => body,
        };

        serde_json::from_str(json).map_err(|err| DispatchError::Malformed {
            target: target.to_string(),
            detail: err.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, target: &ResolvedTarget) -> Result<Value, DispatchError> {
        let url = self.endpoint(target);
        let target = target.to_string();

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(request_id) = current_request_id() {
            request = request.header(HEADER_REQUEST_ID, request_id);
        }

        let response = request
            .send()
            .await
            .map_err(|err| DispatchError::Transport {
                target: target.clone(),
                source: Box::new(err),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Response {
                target,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| DispatchError::Transport {
                target: target.clone(),
                source: Box::new(err),
            })?;
        self.decode(&target, &body)
    }
}

/// Strip a `callback(...)` envelope, tolerating surrounding whitespace, a
/// leading `/**/` guard, and a trailing semicolon.
#[must_use]
pub fn unwrap_jsonp<'a>(body: &'a str, callback: &str) -> Option<&'a str> {
    let trimmed = body.trim();
    let trimmed = trimmed.strip_prefix("/**/").unwrap_or(trimmed).trim_start();
    let inner = trimmed
        .strip_prefix(callback)?
        .trim_start()
        .strip_prefix('(')?;
    let inner = inner.trim_end();
    let inner = inner.strip_suffix(';').unwrap_or(inner).trim_end();
    inner.strip_suffix(')')
}

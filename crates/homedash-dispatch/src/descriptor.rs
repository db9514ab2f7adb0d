//! Request descriptors and target resolution.
//!
//! # Design
//! - A descriptor is created per call, sent once, and never retained by the
//!   dispatcher.
//! - Resolution appends one `/`-prefixed, percent-encoded segment per
//!   parameter, in order, so identical descriptors always resolve identically.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;

/// Correlation token attached to every descriptor and echoed in its outcome.
pub type RequestId = Uuid;

/// Identifier naming a continuation registered with a [`crate::Requestor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationId(String);

impl ContinuationId {
    /// Wrap a caller-chosen continuation name.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContinuationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ContinuationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContinuationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Primitive value appended to the base target as a path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    /// Free-form text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer too large for `i64`.
    Unsigned(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
}

impl Display for Parameter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => formatter.write_str(value),
            Self::Integer(value) => write!(formatter, "{value}"),
            Self::Unsigned(value) => write!(formatter, "{value}"),
            Self::Float(value) => write!(formatter, "{value}"),
            Self::Bool(value) => write!(formatter, "{value}"),
        }
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for Parameter {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u64> for Parameter {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Unsigned(value), Self::Integer)
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Parameter {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Message describing what to call and which continuations receive the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Correlation identifier echoed in the terminal message.
    pub request_id: RequestId,
    /// Path (or absolute URL) the parameters are appended to.
    #[serde(rename = "url")]
    pub base_target: String,
    /// Ordered values appended as path segments.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Continuation addressed on success.
    pub on_success: ContinuationId,
    /// Continuation addressed on failure.
    pub on_error: ContinuationId,
}

impl RequestDescriptor {
    /// Build a descriptor with a fresh request identifier and no parameters.
    #[must_use]
    pub fn new(
        base_target: impl Into<String>,
        on_success: impl Into<ContinuationId>,
        on_error: impl Into<ContinuationId>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            base_target: base_target.into(),
            parameters: Vec::new(),
            on_success: on_success.into(),
            on_error: on_error.into(),
        }
    }

    /// Append a single parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: impl Into<Parameter>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// Append every parameter yielded by `parameters`, preserving order.
    #[must_use]
    pub fn with_parameters<I, P>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Parameter>,
    {
        self.parameters.extend(parameters.into_iter().map(Into::into));
        self
    }

    /// Build the request target for this descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidDescriptor`] when the base target is
    /// blank or a parameter is a `.`/`..` dot segment, which URL normalisation
    /// would collapse on the wire.
    pub fn resolve(&self) -> Result<ResolvedTarget, DispatchError> {
        if self.base_target.trim().is_empty() {
            return Err(DispatchError::InvalidDescriptor {
                field: "url",
                reason: "must not be empty",
            });
        }

        let mut target = self.base_target.clone();
        for parameter in &self.parameters {
            let text = parameter.to_string();
            if matches!(text.as_str(), "." | "..") {
                return Err(DispatchError::InvalidDescriptor {
                    field: "parameters",
                    reason: "must not contain dot segments",
                });
            }
            target.push('/');
            target.push_str(&urlencoding::encode(&text));
        }
        Ok(ResolvedTarget(target))
    }
}

/// Fully built request path after parameter encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedTarget(String);

impl ResolvedTarget {
    /// Borrow the resolved target.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the target, returning the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ResolvedTarget {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedTarget {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

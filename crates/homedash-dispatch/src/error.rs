//! Error types for dispatch and requestor operations.
//!
//! # Design
//! - Dispatch errors never escape the dispatcher; they collapse into a
//!   [`crate::Outcome::Failure`] addressed to the caller's error continuation.
//! - Error messages are constant; operational context lives in fields.

use std::error::Error;

use thiserror::Error;

use crate::descriptor::{ContinuationId, RequestId};

/// Failure raised while serving a single dispatched call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The descriptor could not be resolved into a target.
    #[error("invalid request descriptor")]
    InvalidDescriptor {
        /// Descriptor field that failed validation.
        field: &'static str,
        /// Static reason describing the invalid value.
        reason: &'static str,
    },
    /// The remote endpoint could not be reached.
    #[error("transport failure")]
    Transport {
        /// Target the call was issued against.
        target: String,
        /// Underlying client error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The remote endpoint answered with a non-success status.
    #[error("remote endpoint returned an error status")]
    Response {
        /// Target the call was issued against.
        target: String,
        /// HTTP status code.
        status: u16,
    },
    /// The response body was not the expected structured payload.
    #[error("malformed response")]
    Malformed {
        /// Target the call was issued against.
        target: String,
        /// Parser diagnostic.
        detail: String,
    },
    /// The transport stopped before producing a result.
    #[error("dispatch aborted")]
    Aborted {
        /// Target the call was issued against.
        target: String,
    },
}

impl DispatchError {
    /// Numeric code surfaced alongside the failure, when one exists.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable failure reason reported to the caller.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::InvalidDescriptor { field, reason } => format!("{self}: {field} {reason}"),
            Self::Transport { target, source } => format!("{self} for {target}: {source}"),
            Self::Response { target, status } => format!("{self} {status} for {target}"),
            Self::Malformed { target, detail } => format!("{self} from {target}: {detail}"),
            Self::Aborted { target } => format!("{self} for {target}"),
        }
    }
}

/// Errors returned to the requestor by its own operations.
#[derive(Debug, Error)]
pub enum RequestorError {
    /// The dispatcher inbox has been closed.
    #[error("dispatcher is no longer accepting requests")]
    DispatcherClosed {
        /// Request that could not be sent.
        request_id: RequestId,
    },
    /// A descriptor or outcome named a continuation that is not registered.
    #[error("continuation '{id}' is not registered")]
    UnknownContinuation {
        /// Missing continuation identifier.
        id: ContinuationId,
    },
    /// An outcome was addressed to a continuation other than the one the
    /// originating descriptor registered for that outcome kind.
    #[error("outcome addressed to an unexpected continuation")]
    ContinuationMismatch {
        /// Request the outcome belongs to.
        request_id: RequestId,
        /// Continuation registered for the outcome kind.
        expected: ContinuationId,
        /// Continuation the outcome was addressed to.
        received: ContinuationId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use uuid::Uuid;

    #[test]
    fn dispatch_error_reason_and_code() {
        let cases = vec![
            (
                DispatchError::InvalidDescriptor {
                    field: "url",
                    reason: "must not be empty",
                },
                "invalid request descriptor: url must not be empty",
                None,
                false,
            ),
            (
                DispatchError::Transport {
                    target: "/api/device".to_string(),
                    source: Box::new(io::Error::other("connection refused")),
                },
                "transport failure for /api/device: connection refused",
                None,
                true,
            ),
            (
                DispatchError::Response {
                    target: "/api/device".to_string(),
                    status: 503,
                },
                "remote endpoint returned an error status 503 for /api/device",
                Some(503),
                false,
            ),
            (
                DispatchError::Malformed {
                    target: "/api/device".to_string(),
                    detail: "expected value at line 1 column 1".to_string(),
                },
                "malformed response from /api/device: expected value at line 1 column 1",
                None,
                false,
            ),
            (
                DispatchError::Aborted {
                    target: "/api/device".to_string(),
                },
                "dispatch aborted for /api/device",
                None,
                false,
            ),
        ];

        for (err, reason, code, has_source) in cases {
            assert_eq!(err.reason(), reason);
            assert_eq!(err.code(), code);
            assert_eq!(err.source().is_some(), has_source);
        }
    }

    #[test]
    fn requestor_error_messages() {
        let request_id = Uuid::nil();
        assert_eq!(
            RequestorError::DispatcherClosed { request_id }.to_string(),
            "dispatcher is no longer accepting requests"
        );
        assert_eq!(
            RequestorError::UnknownContinuation {
                id: ContinuationId::from("s9"),
            }
            .to_string(),
            "continuation 's9' is not registered"
        );
        assert_eq!(
            RequestorError::ContinuationMismatch {
                request_id,
                expected: ContinuationId::from("s1"),
                received: ContinuationId::from("s2"),
            }
            .to_string(),
            "outcome addressed to an unexpected continuation"
        );
    }
}

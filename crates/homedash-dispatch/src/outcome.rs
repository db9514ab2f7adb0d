//! Terminal messages emitted by the dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{ContinuationId, RequestDescriptor, RequestId};
use crate::error::DispatchError;

/// Terminal result of a dispatched call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The endpoint answered with a structured payload.
    Success {
        /// Decoded response body.
        payload: Value,
    },
    /// The call failed in transport, status, or decoding.
    Failure {
        /// Human-readable failure description.
        reason: String,
        /// Status code when the endpoint answered with an error status.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<u16>,
    },
}

impl Outcome {
    /// Whether this outcome is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
        }
    }
}

impl From<DispatchError> for Outcome {
    fn from(err: DispatchError) -> Self {
        Self::Failure {
            reason: err.reason(),
            code: err.code(),
        }
    }
}

/// Dispatcher → requestor message carrying one terminal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeMessage {
    /// Request the outcome belongs to.
    pub request_id: RequestId,
    /// Continuation the requestor should invoke.
    pub continuation: ContinuationId,
    /// Terminal result.
    pub outcome: Outcome,
}

impl OutcomeMessage {
    /// Address the result of serving `descriptor` to the matching continuation.
    #[must_use]
    pub fn settle(descriptor: &RequestDescriptor, result: Result<Value, DispatchError>) -> Self {
        let (continuation, outcome) = match result {
            Ok(payload) => (descriptor.on_success.clone(), Outcome::Success { payload }),
            Err(err) => (descriptor.on_error.clone(), Outcome::from(err)),
        };
        Self {
            request_id: descriptor.request_id,
            continuation,
            outcome,
        }
    }
}

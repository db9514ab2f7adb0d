//! UI-side requestor: continuation registry and outcome correlation.
//!
//! # Design
//! - Continuations stay in a local lookup table; only their identifiers travel
//!   to the dispatcher inside descriptors.
//! - Terminal messages are correlated by request id, never by arrival order.
//! - Each pending request is resolved at most once; late or duplicate messages
//!   are ignored, which is how callers layer their own timeouts (`abandon`).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::descriptor::{ContinuationId, Parameter, RequestDescriptor, RequestId};
use crate::dispatcher::{self, DispatcherHandle};
use crate::error::RequestorError;
use crate::outcome::{Outcome, OutcomeMessage};
use crate::transport::Transport;

/// Result handed to a continuation when its request completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Request that completed.
    pub request_id: RequestId,
    /// Terminal outcome.
    pub outcome: Outcome,
}

/// Callback registered under a [`ContinuationId`].
pub type Continuation = Box<dyn FnMut(Completion)>;

/// What happened to a delivered terminal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The addressed continuation was invoked.
    Invoked {
        /// Request that completed.
        request_id: RequestId,
        /// Continuation that ran.
        continuation: ContinuationId,
    },
    /// The request was unknown, abandoned, or already resolved.
    Ignored {
        /// Request named by the message.
        request_id: RequestId,
    },
}

struct PendingRequest {
    on_success: ContinuationId,
    on_error: ContinuationId,
}

/// Issues descriptors and routes their outcomes to registered continuations.
///
/// Continuations are not `Send`; the requestor lives on the UI context that
/// owns them.
pub struct Requestor {
    dispatcher: DispatcherHandle,
    outcomes: mpsc::Receiver<OutcomeMessage>,
    continuations: HashMap<ContinuationId, Continuation>,
    pending: HashMap<RequestId, PendingRequest>,
}

#[allow(clippy::future_not_send)]
impl Requestor {
    /// Attach to an already spawned dispatcher.
    #[must_use]
    pub fn new(dispatcher: DispatcherHandle, outcomes: mpsc::Receiver<OutcomeMessage>) -> Self {
        Self {
            dispatcher,
            outcomes,
            continuations: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Spawn a dispatcher over `transport` and attach to it.
    #[must_use]
    pub fn connect(transport: Arc<dyn Transport>, config: &DispatchConfig) -> Self {
        let (handle, outcomes, _task) = dispatcher::spawn(transport, config);
        Self::new(handle, outcomes)
    }

    /// Register `continuation` under `id`, returning `true` if it replaced one.
    pub fn register<F>(&mut self, id: impl Into<ContinuationId>, continuation: F) -> bool
    where
        F: FnMut(Completion) + 'static,
    {
        self.continuations
            .insert(id.into(), Box::new(continuation))
            .is_some()
    }

    /// Remove the continuation registered under `id`.
    pub fn unregister(&mut self, id: &ContinuationId) -> bool {
        self.continuations.remove(id).is_some()
    }

    /// Build and send a descriptor, returning its request id without waiting
    /// for completion.
    ///
    /// # Errors
    ///
    /// Returns an error if either continuation is unregistered or the
    /// dispatcher has stopped.
    pub async fn request<I, P>(
        &mut self,
        base_target: impl Into<String>,
        parameters: I,
        on_success: impl Into<ContinuationId>,
        on_error: impl Into<ContinuationId>,
    ) -> Result<RequestId, RequestorError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Parameter>,
    {
        let descriptor =
            RequestDescriptor::new(base_target, on_success, on_error).with_parameters(parameters);
        self.submit(descriptor).await
    }

    /// Send a prebuilt descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if either continuation is unregistered or the
    /// dispatcher has stopped.
    pub async fn submit(&mut self, descriptor: RequestDescriptor) -> Result<RequestId, RequestorError> {
        for id in [&descriptor.on_success, &descriptor.on_error] {
            if !self.continuations.contains_key(id) {
                return Err(RequestorError::UnknownContinuation { id: id.clone() });
            }
        }

        let request_id = descriptor.request_id;
        self.pending.insert(
            request_id,
            PendingRequest {
                on_success: descriptor.on_success.clone(),
                on_error: descriptor.on_error.clone(),
            },
        );
        debug!(
            request_id = %request_id,
            target = %descriptor.base_target,
            parameters = descriptor.parameters.len(),
            "submitting request"
        );

        if let Err(err) = self.dispatcher.send(descriptor).await {
            self.pending.remove(&request_id);
            return Err(err);
        }
        Ok(request_id)
    }

    /// Route one terminal message to its continuation.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is addressed to a continuation other
    /// than the one registered for its outcome kind, or if that continuation
    /// has since been unregistered. The request is resolved either way.
    pub fn deliver(&mut self, message: OutcomeMessage) -> Result<Delivery, RequestorError> {
        let OutcomeMessage {
            request_id,
            continuation,
            outcome,
        } = message;

        let Some(pending) = self.pending.remove(&request_id) else {
            debug!(request_id = %request_id, "ignoring outcome for unknown or settled request");
            return Ok(Delivery::Ignored { request_id });
        };

        let expected = if outcome.is_success() {
            pending.on_success
        } else {
            pending.on_error
        };
        if continuation != expected {
            warn!(
                request_id = %request_id,
                expected = %expected,
                received = %continuation,
                "outcome addressed to an unexpected continuation"
            );
            return Err(RequestorError::ContinuationMismatch {
                request_id,
                expected,
                received: continuation,
            });
        }

        let Some(callback) = self.continuations.get_mut(&expected) else {
            return Err(RequestorError::UnknownContinuation { id: expected });
        };
        callback(Completion {
            request_id,
            outcome,
        });
        Ok(Delivery::Invoked {
            request_id,
            continuation: expected,
        })
    }

    /// Wait for the next terminal message and deliver it.
    ///
    /// Returns `None` once the dispatcher has stopped and every outcome has
    /// been consumed. While this requestor holds its dispatcher handle the
    /// channel stays open, so callers should only wait while [`Self::pending`]
    /// is non-zero.
    pub async fn recv(&mut self) -> Option<Result<Delivery, RequestorError>> {
        let message = self.outcomes.recv().await?;
        Some(self.deliver(message))
    }

    /// Deliver outcomes until no request is pending.
    pub async fn drain(&mut self) -> Vec<Result<Delivery, RequestorError>> {
        let mut deliveries = Vec::new();
        while !self.pending.is_empty() {
            match self.recv().await {
                Some(delivery) => deliveries.push(delivery),
                None => break,
            }
        }
        deliveries
    }

    /// Forget a pending request so that its eventual outcome is ignored.
    pub fn abandon(&mut self, request_id: &RequestId) -> bool {
        self.pending.remove(request_id).is_some()
    }

    /// Number of requests awaiting a terminal message.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether `request_id` is still awaiting a terminal message.
    #[must_use]
    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }
}

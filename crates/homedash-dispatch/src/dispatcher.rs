//! Background dispatcher: one descriptor in, exactly one outcome out.
//!
//! # Design
//! - The dispatcher owns no per-request state; each descriptor is served in its
//!   own task so slow endpoints never hold back faster ones.
//! - Every served descriptor produces exactly one [`OutcomeMessage`], including
//!   invalid descriptors and transports that panic mid-call.
//! - Closing every [`DispatcherHandle`] drains in-flight calls, then stops the loop.
//! - Call failures travel only inside the outcome message; the dispatcher emits
//!   nothing above `trace` level for them.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use homedash_telemetry::{request_span, with_request_context};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, trace};

use crate::config::DispatchConfig;
use crate::descriptor::{RequestDescriptor, ResolvedTarget};
use crate::error::{DispatchError, RequestorError};
use crate::outcome::OutcomeMessage;
use crate::transport::Transport;

/// Serves descriptors against an injected transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    outcomes: mpsc::Sender<OutcomeMessage>,
}

impl Dispatcher {
    /// Build a dispatcher that reports outcomes on `outcomes`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, outcomes: mpsc::Sender<OutcomeMessage>) -> Self {
        Self {
            transport,
            outcomes,
        }
    }

    /// Serve one descriptor and emit its terminal message.
    ///
    /// Never fails: errors are reported as
    /// [`Outcome::Failure`](crate::outcome::Outcome::Failure) addressed to the
    /// descriptor's error continuation. Failures are not logged here; reporting
    /// them is the requestor's job.
    pub async fn handle(&self, descriptor: RequestDescriptor) {
        let message = self.settle(&descriptor).await;
        self.emit(message).await;
    }

    async fn settle(&self, descriptor: &RequestDescriptor) -> OutcomeMessage {
        let target = match descriptor.resolve() {
            Ok(target) => target,
            Err(err) => return OutcomeMessage::settle(descriptor, Err(err)),
        };

        let request_id = descriptor.request_id.to_string();
        let span = request_span(&request_id, target.as_str());
        let result = with_request_context(request_id, async {
            debug!("dispatching request");
            self.guarded_fetch(&target).await
        })
        .instrument(span)
        .await;

        OutcomeMessage::settle(descriptor, result)
    }

    async fn guarded_fetch(&self, target: &ResolvedTarget) -> Result<Value, DispatchError> {
        AssertUnwindSafe(self.transport.fetch(target))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(DispatchError::Aborted {
                    target: target.to_string(),
                })
            })
    }

    async fn emit(&self, message: OutcomeMessage) {
        trace!(
            request_id = %message.request_id,
            continuation = %message.continuation,
            outcome = message.outcome.kind(),
            "request settled"
        );

        if let Err(err) = self.outcomes.send(message).await {
            debug!(
                request_id = %err.0.request_id,
                "requestor dropped before outcome delivery"
            );
        }
    }
}

/// Send side of a spawned dispatcher.
#[derive(Clone)]
pub struct DispatcherHandle {
    requests: mpsc::Sender<RequestDescriptor>,
}

impl DispatcherHandle {
    /// Hand a descriptor to the dispatcher.
    ///
    /// Suspends only while the inbox is full; completion is reported later on
    /// the outcome channel.
    ///
    /// # Errors
    ///
    /// Returns [`RequestorError::DispatcherClosed`] if the dispatcher task has stopped.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<(), RequestorError> {
        self.requests
            .send(descriptor)
            .await
            .map_err(|err| RequestorError::DispatcherClosed {
                request_id: err.0.request_id,
            })
    }

    /// Whether the dispatcher task has stopped accepting descriptors.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

/// Spawn the dispatcher task.
///
/// Returns the handle used to submit descriptors, the receiver for terminal
/// messages, and the task handle that completes once every handle has been
/// dropped and in-flight calls have been reported.
#[must_use]
pub fn spawn(
    transport: Arc<dyn Transport>,
    config: &DispatchConfig,
) -> (DispatcherHandle, mpsc::Receiver<OutcomeMessage>, JoinHandle<()>) {
    let (requests, mut inbox) = mpsc::channel(config.inbox_capacity.max(1));
    let (outcomes, outcome_rx) = mpsc::channel(config.outbox_capacity.max(1));
    let dispatcher = Dispatcher::new(transport, outcomes);

    let task = tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                descriptor = inbox.recv() => {
                    match descriptor {
                        Some(descriptor) => {
                            let dispatcher = dispatcher.clone();
                            in_flight.spawn(async move { dispatcher.handle(descriptor).await });
                        }
                        None => break,
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(err) = joined {
                        debug!(error = %err, "dispatch task ended abnormally");
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(err) = joined {
                debug!(error = %err, "dispatch task ended abnormally during shutdown");
            }
        }
        debug!("dispatcher inbox closed");
    });

    (DispatcherHandle { requests }, outcome_rx, task)
}

//! Request-scoped tracing helpers.
//!
//! # Design
//! - Keeps the correlation identifier of the call being served in task-local
//!   storage so transports can forward it without threading it through every
//!   signature.
//! - Span fields mirror the task-local values.

use std::future::Future;
use std::sync::Arc;

use tracing::Span;

/// Build the span that wraps a single dispatched call.
#[must_use]
pub fn request_span(request_id: &str, target: &str) -> Span {
    tracing::info_span!("dispatch", request_id = %request_id, target = %target)
}

/// Retrieve the request identifier of the call currently being served, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    ACTIVE_REQUEST
        .try_with(|ctx| ctx.request_id.as_ref().to_string())
        .ok()
}

/// Execute the provided future with the supplied request identifier available
/// to [`current_request_id`].
pub async fn with_request_context<Fut, T>(request_id: impl Into<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let context = RequestContext {
        request_id: Arc::from(request_id.into()),
    };
    ACTIVE_REQUEST.scope(context, fut).await
}

#[derive(Clone)]
struct RequestContext {
    request_id: Arc<str>,
}

tokio::task_local! {
    static ACTIVE_REQUEST: RequestContext;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_span_is_named_dispatch() {
        let span = request_span("req-1", "/api/device/12");
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "dispatch");
        }
    }

    #[tokio::test]
    async fn with_request_context_exposes_identifier() {
        let output = with_request_context("req-42", async {
            assert_eq!(current_request_id().as_deref(), Some("req-42"));
            "done"
        })
        .await;
        assert_eq!(output, "done");
        assert!(current_request_id().is_none());
    }
}

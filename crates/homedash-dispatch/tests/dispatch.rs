//! End-to-end round trips through a requestor, a spawned dispatcher, and the
//! HTTP transport against a mock endpoint.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use homedash_dispatch::{
    Completion, Delivery, DispatchConfig, HttpTransport, Outcome, RequestId, Requestor,
};
use httpmock::prelude::*;
use serde_json::json;

type Log = Rc<RefCell<Vec<(&'static str, Completion)>>>;

fn requestor_for(server: &MockServer) -> Result<Requestor> {
    let config = DispatchConfig {
        base_url: server.base_url(),
        request_timeout_secs: 5,
        ..DispatchConfig::default()
    };
    let transport = HttpTransport::from_config(&config)?;
    Ok(Requestor::connect(Arc::new(transport), &config))
}

fn record(requestor: &mut Requestor, log: &Log, ids: &[&'static str]) {
    for &id in ids {
        let log = Rc::clone(log);
        requestor.register(id, move |completion| log.borrow_mut().push((id, completion)));
    }
}

#[tokio::test]
async fn device_toggle_reaches_success_continuation() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/device/12/on")
            .header("accept", "application/json");
        then.status(200).json_body(json!({"id": 12, "state": "on"}));
    });

    let log: Log = Rc::default();
    let mut requestor = requestor_for(&server)?;
    record(&mut requestor, &log, &["s1", "e1"]);

    let request_id = requestor.request("/api/device", ["12", "on"], "s1", "e1").await?;
    let deliveries = requestor.drain().await;

    mock.assert();
    assert_eq!(deliveries.len(), 1);
    assert!(matches!(
        &deliveries[0],
        Ok(Delivery::Invoked { continuation, .. }) if continuation.as_str() == "s1"
    ));
    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, "s1");
    assert_eq!(log[0].1.request_id, request_id);
    assert_eq!(
        log[0].1.outcome,
        Outcome::Success {
            payload: json!({"id": 12, "state": "on"})
        }
    );
    Ok(())
}

#[tokio::test]
async fn error_status_reaches_error_continuation_only() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/device/12/on");
        then.status(502).body("bad gateway");
    });

    let log: Log = Rc::default();
    let mut requestor = requestor_for(&server)?;
    record(&mut requestor, &log, &["s1", "e1"]);

    requestor.request("/api/device", ["12", "on"], "s1", "e1").await?;
    requestor.drain().await;

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, "e1");
    match &log[0].1.outcome {
        Outcome::Failure { reason, code } => {
            assert_eq!(*code, Some(502));
            assert!(!reason.is_empty());
        }
        Outcome::Success { .. } => panic!("expected failure"),
    }
    Ok(())
}

#[tokio::test]
async fn spaced_parameter_is_percent_encoded_on_the_wire() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/scene/a%20b");
        then.status(200).json_body(json!({"scene": "a b"}));
    });

    let log: Log = Rc::default();
    let mut requestor = requestor_for(&server)?;
    record(&mut requestor, &log, &["ok", "err"]);

    requestor.request("/api/scene", ["a b"], "ok", "err").await?;
    requestor.drain().await;

    mock.assert();
    assert_eq!(log.borrow()[0].0, "ok");
    Ok(())
}

#[tokio::test]
async fn concurrent_calls_are_attributed_by_request_id() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/sensor/slow");
        then.status(200)
            .delay(Duration::from_millis(200))
            .json_body(json!({"sensor": "slow"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/sensor/fast");
        then.status(200).json_body(json!({"sensor": "fast"}));
    });

    let log: Log = Rc::default();
    let mut requestor = requestor_for(&server)?;
    record(&mut requestor, &log, &["slow.ok", "fast.ok", "err"]);

    let slow: RequestId = requestor.request("/api/sensor", ["slow"], "slow.ok", "err").await?;
    let fast: RequestId = requestor.request("/api/sensor", ["fast"], "fast.ok", "err").await?;
    assert_eq!(requestor.pending(), 2);

    let deliveries = requestor.drain().await;
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries.iter().all(Result::is_ok));

    let log = log.borrow();
    let completion_for = |request_id: RequestId| {
        log.iter()
            .find(|(_, completion)| completion.request_id == request_id)
            .map(|(id, completion)| (*id, completion.outcome.clone()))
    };
    assert_eq!(
        completion_for(slow),
        Some(("slow.ok", Outcome::Success { payload: json!({"sensor": "slow"}) }))
    );
    assert_eq!(
        completion_for(fast),
        Some(("fast.ok", Outcome::Success { payload: json!({"sensor": "fast"}) }))
    );
    Ok(())
}

#[tokio::test]
async fn failures_do_not_stop_later_calls() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/broken");
        then.status(200).body("not json");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/status");
        then.status(200).json_body(json!({"ok": true}));
    });

    let log: Log = Rc::default();
    let mut requestor = requestor_for(&server)?;
    record(&mut requestor, &log, &["ok", "err"]);

    requestor.request("/api/broken", Vec::<String>::new(), "ok", "err").await?;
    requestor.drain().await;
    requestor.request("/api/status", Vec::<String>::new(), "ok", "err").await?;
    requestor.drain().await;

    let log = log.borrow();
    let order: Vec<&str> = log.iter().map(|(id, _)| *id).collect();
    assert_eq!(order, ["err", "ok"]);
    Ok(())
}

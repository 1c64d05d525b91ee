//! Tests for background fetch execution and completion marshaling.

use lumo_net::{
    FetchOutcome, NetBridge, Transport, TransportError, TransportRequest, TransportResponse,
};
use std::sync::Arc;
use std::time::Duration;

/// A canned transport keyed on the request URL.
struct MockTransport;

impl Transport for MockTransport {
    fn fetch(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        match request.url.as_str() {
            "https://example/ok" => Ok(TransportResponse {
                status: 200,
                status_text: "OK".to_string(),
                headers: vec![],
                body: b"hello".to_vec(),
            }),
            "https://example/aborted" => Err(TransportError::Aborted),
            _ => Err(TransportError::Network("unreachable".to_string())),
        }
    }
}

#[test]
fn completions_arrive_on_the_channel_with_matching_tokens() {
    let (mut bridge, receiver) = NetBridge::new(Arc::new(MockTransport));

    let token = bridge.fetch(TransportRequest::get("https://example/ok"));
    let completion = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(completion.token, token);
    match completion.outcome {
        FetchOutcome::Response(response) => {
            assert_eq!(response.status, 200);
            assert_eq!(response.body, b"hello");
        }
        other => panic!("expected a response, got {other:?}"),
    }
}

#[test]
fn failures_and_aborts_map_to_their_outcomes() {
    let (mut bridge, receiver) = NetBridge::new(Arc::new(MockTransport));

    let fail = bridge.fetch(TransportRequest::get("https://example/down"));
    let abort = bridge.fetch(TransportRequest::get("https://example/aborted"));

    let mut saw_fail = false;
    let mut saw_abort = false;
    for _ in 0..2 {
        let completion = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        if completion.token == fail {
            assert!(matches!(completion.outcome, FetchOutcome::Failed(_)));
            saw_fail = true;
        } else if completion.token == abort {
            assert!(matches!(completion.outcome, FetchOutcome::Aborted));
            saw_abort = true;
        }
    }
    assert!(saw_fail && saw_abort);
}

#[test]
fn tokens_are_unique_across_fetches() {
    let (mut bridge, _receiver) = NetBridge::new(Arc::new(MockTransport));
    let a = bridge.fetch(TransportRequest::get("https://example/ok"));
    let b = bridge.fetch(TransportRequest::get("https://example/ok"));
    assert_ne!(a, b);
}

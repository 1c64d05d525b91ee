//! Tests for the XHR state machine: lifecycle, event sequencing, and
//! response decoding.

use lumo_net::{
    FetchOutcome, ReadyState, ResponseBody, TransportError, TransportResponse, XhrEvent,
    XhrRequest,
};

fn response(status: u16, body: &[u8]) -> TransportResponse {
    TransportResponse {
        status,
        status_text: String::new(),
        headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        body: body.to_vec(),
    }
}

// ========== lifecycle ==========

#[test]
fn open_moves_to_opened_and_notifies_synchronously() {
    let mut xhr = XhrRequest::new();
    assert_eq!(xhr.ready_state(), ReadyState::Unsent);
    assert_eq!(xhr.ready_state().code(), 0);

    let events = xhr.open("GET", "./data.json");
    assert_eq!(events, vec![XhrEvent::ReadyStateChange]);
    assert_eq!(xhr.ready_state(), ReadyState::Opened);
    assert_eq!(xhr.ready_state().code(), 1);
    assert_eq!(xhr.method(), "GET");
    assert_eq!(xhr.url(), "./data.json");
}

#[test]
fn reopen_resets_headers_and_response() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/a");
    xhr.set_request_header("X-One", "1");
    xhr.begin_send();
    xhr.complete(FetchOutcome::Response(response(200, b"hello")));
    assert_eq!(xhr.status(), 200);

    xhr.open("POST", "https://example/b");
    assert_eq!(xhr.ready_state(), ReadyState::Opened);
    assert_eq!(xhr.status(), 0);
    assert!(xhr.request_headers().is_empty());
    assert!(xhr.response().is_none());
}

#[test]
fn request_headers_accumulate_with_duplicates_in_order() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.set_request_header("Accept", "text/html");
    xhr.set_request_header("X-Tag", "a");
    xhr.set_request_header("X-Tag", "b");

    let headers = xhr.request_headers();
    assert_eq!(headers.len(), 3);
    assert_eq!(headers[1], ("X-Tag".to_string(), "a".to_string()));
    assert_eq!(headers[2], ("X-Tag".to_string(), "b".to_string()));
}

// ========== bundled path ==========

#[test]
fn bundled_completion_is_synchronous_done_200() {
    let mut xhr = XhrRequest::new();
    let events = xhr.open("GET", "./data.json");
    assert_eq!(events, vec![XhrEvent::ReadyStateChange]);

    let events = xhr.complete_bundled("{\"a\":1}".to_string());
    // Only readystatechange for the bundled path.
    assert_eq!(events, vec![XhrEvent::ReadyStateChange]);
    assert_eq!(xhr.status(), 200);
    assert_eq!(xhr.ready_state(), ReadyState::Done);
    assert_eq!(xhr.response_text(), Some("{\"a\":1}"));
}

#[test]
fn missing_bundled_resource_errors() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "./missing.json");
    let events = xhr.fail_bundled();
    assert_eq!(
        events,
        vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd]
    );
}

// ========== network path ==========

#[test]
fn success_fires_readystatechange_load_loadend_in_order() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    let events = xhr.begin_send();
    assert_eq!(events, vec![XhrEvent::ReadyStateChange]);
    assert_eq!(xhr.ready_state(), ReadyState::Loading);

    let events = xhr.complete(FetchOutcome::Response(response(200, b"payload")));
    assert_eq!(
        events,
        vec![XhrEvent::ReadyStateChange, XhrEvent::Load, XhrEvent::LoadEnd]
    );
    assert_eq!(xhr.ready_state(), ReadyState::Done);
    assert_eq!(xhr.status(), 200);
    assert_eq!(xhr.response_text(), Some("payload"));
}

#[test]
fn http_404_invokes_onerror_and_never_onload() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.begin_send();

    let events = xhr.complete(FetchOutcome::Response(response(404, b"nope")));
    assert_eq!(
        events,
        vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd]
    );
    assert!(!events.contains(&XhrEvent::Load));
    assert_eq!(xhr.status(), 404);
    assert!(xhr.response().is_none(), "error responses carry no body");
}

#[test]
fn http_304_sets_status_with_no_further_callbacks() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.begin_send();

    let events = xhr.complete(FetchOutcome::Response(response(304, b"")));
    assert!(events.is_empty());
    assert_eq!(xhr.status(), 304);
    // The state already reached stays put.
    assert_eq!(xhr.ready_state(), ReadyState::Loading);
}

#[test]
fn transport_failure_surfaces_as_onerror() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.begin_send();

    let events = xhr.complete(FetchOutcome::Failed(TransportError::Network(
        "connection refused".to_string(),
    )));
    assert_eq!(
        events,
        vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd]
    );
}

#[test]
fn aborted_completion_is_suppressed_entirely() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.begin_send();

    let events = xhr.complete(FetchOutcome::Aborted);
    assert!(events.is_empty());
    assert_eq!(xhr.ready_state(), ReadyState::Loading);
    assert_eq!(xhr.status(), 0);
}

// ========== response decoding ==========

#[test]
fn json_response_type_parses_structured_data() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.set_response_type("json");
    xhr.begin_send();
    xhr.complete(FetchOutcome::Response(response(200, b"{\"n\": 3}")));

    match xhr.response() {
        Some(ResponseBody::Json(value)) => assert_eq!(value["n"], 3),
        other => panic!("expected JSON body, got {other:?}"),
    }
    assert_eq!(xhr.response_text(), None);
}

#[test]
fn malformed_json_is_an_error_not_a_load() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.set_response_type("json");
    xhr.begin_send();

    let events = xhr.complete(FetchOutcome::Response(response(200, b"not json")));
    assert_eq!(
        events,
        vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd]
    );
    assert!(xhr.response().is_none());
}

#[test]
fn arraybuffer_response_type_keeps_raw_bytes() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.set_response_type("arraybuffer");
    xhr.begin_send();
    xhr.complete(FetchOutcome::Response(response(200, &[1, 2, 3])));

    assert_eq!(
        xhr.response(),
        Some(&ResponseBody::Bytes(vec![1, 2, 3]))
    );
}

#[test]
fn unknown_response_type_falls_back_to_text() {
    let mut xhr = XhrRequest::new();
    xhr.set_response_type("blob");
    xhr.open("GET", "https://example/x");
    xhr.begin_send();
    xhr.complete(FetchOutcome::Response(response(200, b"abc")));
    assert_eq!(xhr.response_text(), Some("abc"));
}

// ========== response headers ==========

#[test]
fn response_header_lookup_is_case_insensitive() {
    let mut xhr = XhrRequest::new();
    xhr.open("GET", "https://example/x");
    xhr.begin_send();
    xhr.complete(FetchOutcome::Response(TransportResponse {
        status: 200,
        status_text: "OK".to_string(),
        headers: vec![
            ("Content-Type".to_string(), "text/plain".to_string()),
            ("x-dup".to_string(), "a".to_string()),
            ("X-Dup".to_string(), "b".to_string()),
        ],
        body: b"ok".to_vec(),
    }));

    assert_eq!(
        xhr.get_response_header("content-type").as_deref(),
        Some("text/plain")
    );
    assert_eq!(xhr.get_response_header("X-DUP").as_deref(), Some("a, b"));
    assert_eq!(xhr.get_response_header("missing"), None);

    let all = xhr.get_all_response_headers().unwrap();
    assert!(all.contains("Content-Type: text/plain\r\n"));
}

#[test]
fn no_headers_before_any_response() {
    let xhr = XhrRequest::new();
    assert_eq!(xhr.get_response_header("anything"), None);
    assert_eq!(xhr.get_all_response_headers(), None);
}

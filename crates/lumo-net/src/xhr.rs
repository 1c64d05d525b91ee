//! The XMLHttpRequest-style request state machine.
//!
//! [`XhrRequest`] is pure state: it never performs I/O and never invokes
//! callbacks. State transitions return the ordered list of [`XhrEvent`]s
//! the embedding layer must dispatch — which keeps the mandated callback
//! sequencing (`onreadystatechange`, `onload`, `onloadend`, with
//! `onerror` substituting for `onload` on failure) in one testable place.

use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::bridge::FetchOutcome;
use crate::transport::TransportResponse;

/// The five-valued request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ReadyState {
    /// No `open` yet.
    Unsent,
    /// `open` was called.
    Opened,
    /// Headers arrived (reserved; the bridge jumps straight to Loading).
    HeadersReceived,
    /// The request departed.
    Loading,
    /// Terminal.
    Done,
}

impl ReadyState {
    /// The numeric constant exposed to the script (0–4).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unsent => 0,
            Self::Opened => 1,
            Self::HeadersReceived => 2,
            Self::Loading => 3,
            Self::Done => 4,
        }
    }
}

/// How the response body is decoded for the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ResponseType {
    /// `""` or `"text"`: UTF-8 text (the default).
    #[default]
    #[strum(serialize = "text", serialize = "")]
    Text,
    /// `"json"`: parsed structured data.
    Json,
    /// `"arraybuffer"`: raw bytes.
    #[strum(serialize = "arraybuffer")]
    ArrayBuffer,
}

/// The decoded response object.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded text.
    Text(String),
    /// Parsed JSON value.
    Json(serde_json::Value),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

/// A callback the embedding layer must dispatch, in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XhrEvent {
    /// `onreadystatechange`.
    ReadyStateChange,
    /// `onload`.
    Load,
    /// `onloadend`.
    LoadEnd,
    /// `onerror`.
    Error,
}

/// One request object's state. Owned exclusively by its script wrapper;
/// a request owns at most one in-flight fetch.
#[derive(Debug, Default)]
pub struct XhrRequest {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    response_type: ResponseType,
    state: Option<ReadyState>,
    status: u16,
    status_text: String,
    response: Option<ResponseBody>,
    response_headers: Option<Vec<(String, String)>>,
}

impl XhrRequest {
    /// A fresh, unsent request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a (re-)open: method/url/state are replaced, accumulated
    /// request headers and any prior response are discarded. Returns the
    /// events to dispatch (a synchronous readystatechange).
    pub fn open(&mut self, method: &str, url: &str) -> Vec<XhrEvent> {
        self.method = method.to_string();
        self.url = url.to_string();
        self.headers.clear();
        self.response = None;
        self.response_headers = None;
        self.status = 0;
        self.status_text.clear();
        self.state = Some(ReadyState::Opened);
        vec![XhrEvent::ReadyStateChange]
    }

    /// Accumulate a request header. Duplicates are allowed and write
    /// order is preserved for transmission.
    pub fn set_request_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Set the declared response type. Unknown strings fall back to text,
    /// matching the script-facing contract.
    pub fn set_response_type(&mut self, value: &str) {
        self.response_type = ResponseType::from_str(value).unwrap_or_default();
    }

    /// The declared response type.
    #[must_use]
    pub const fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// The request method, as opened.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request URL, as opened.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Accumulated request headers.
    #[must_use]
    pub fn request_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.state.unwrap_or(ReadyState::Unsent)
    }

    /// HTTP status (0 until a response or bundled completion).
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase, when known.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// The decoded response object.
    #[must_use]
    pub const fn response(&self) -> Option<&ResponseBody> {
        self.response.as_ref()
    }

    /// The response as text, when the body decoded as text.
    #[must_use]
    pub fn response_text(&self) -> Option<&str> {
        match &self.response {
            Some(ResponseBody::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Case-insensitive response header lookup; duplicate headers join
    /// with `", "`.
    #[must_use]
    pub fn get_response_header(&self, name: &str) -> Option<String> {
        let headers = self.response_headers.as_ref()?;
        let matches: Vec<&str> = headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect();
        if matches.is_empty() {
            None
        } else {
            Some(matches.join(", "))
        }
    }

    /// All response headers as a `"name: value\r\n"` concatenation.
    #[must_use]
    pub fn get_all_response_headers(&self) -> Option<String> {
        let headers = self.response_headers.as_ref()?;
        Some(
            headers
                .iter()
                .map(|(k, v)| format!("{k}: {v}\r\n"))
                .collect(),
        )
    }

    /// Mark the request as departed: Loading, with its readystatechange,
    /// *before* the background fetch starts.
    pub fn begin_send(&mut self) -> Vec<XhrEvent> {
        self.state = Some(ReadyState::Loading);
        vec![XhrEvent::ReadyStateChange]
    }

    /// Complete synchronously from a bundled resource: status 200, DONE,
    /// body as text. Only readystatechange fires for the bundled path.
    pub fn complete_bundled(&mut self, text: String) -> Vec<XhrEvent> {
        self.status = 200;
        self.status_text = "OK".to_string();
        self.response = Some(ResponseBody::Text(text));
        self.state = Some(ReadyState::Done);
        vec![XhrEvent::ReadyStateChange]
    }

    /// Fail a bundled read: the resource is simply missing, which
    /// surfaces exactly like a network failure.
    pub fn fail_bundled(&mut self) -> Vec<XhrEvent> {
        self.state = Some(ReadyState::Done);
        vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd]
    }

    /// Apply a background fetch outcome, returning the callbacks to
    /// dispatch in order. Runs on the script-owning thread only.
    pub fn complete(&mut self, outcome: FetchOutcome) -> Vec<XhrEvent> {
        match outcome {
            // A cancelled transport is suppressed, not delivered.
            FetchOutcome::Aborted => Vec::new(),
            FetchOutcome::Failed(_) => {
                self.state = Some(ReadyState::Done);
                vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd]
            }
            FetchOutcome::Response(response) => self.apply_response(response),
        }
    }

    fn apply_response(&mut self, response: TransportResponse) -> Vec<XhrEvent> {
        self.response_headers = Some(response.headers);
        self.status_text = response.status_text;

        // 304 is caller-visible but terminal without further callbacks.
        if response.status == 304 {
            self.status = 304;
            return Vec::new();
        }

        self.status = response.status;
        if !(200..300).contains(&response.status) {
            self.state = Some(ReadyState::Done);
            return vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd];
        }

        let decoded = match self.response_type {
            ResponseType::Text => Some(ResponseBody::Text(
                String::from_utf8_lossy(&response.body).into_owned(),
            )),
            ResponseType::ArrayBuffer => Some(ResponseBody::Bytes(response.body)),
            ResponseType::Json => serde_json::from_slice(&response.body)
                .ok()
                .map(ResponseBody::Json),
        };

        self.state = Some(ReadyState::Done);
        match decoded {
            Some(body) => {
                self.response = Some(body);
                vec![XhrEvent::ReadyStateChange, XhrEvent::Load, XhrEvent::LoadEnd]
            }
            // Malformed body for the declared type is an error, never a
            // thrown exception.
            None => vec![XhrEvent::ReadyStateChange, XhrEvent::Error, XhrEvent::LoadEnd],
        }
    }
}

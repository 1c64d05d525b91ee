//! Background fetch execution and the marshaling channel.
//!
//! Script-initiated fetches run on throwaway background threads; each
//! completion is stamped with its [`FetchToken`] and sent through one
//! mpsc channel. The receiving end belongs to the host loop, which is the
//! only place completions re-enter the script execution context — the
//! scripting engine is never touched from a background thread.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use lumo_common::warning::warn_once;

use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// Correlates a background fetch with the request object that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchToken(u64);

impl FetchToken {
    /// The raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// How a background fetch ended.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// A response arrived (any status).
    Response(TransportResponse),
    /// The exchange failed.
    Failed(TransportError),
    /// The exchange was cancelled; the completion must be suppressed.
    Aborted,
}

/// One marshaled completion.
#[derive(Debug)]
pub struct Completion {
    /// The fetch this completion belongs to.
    pub token: FetchToken,
    /// The outcome.
    pub outcome: FetchOutcome,
}

/// Spawns background fetches and stamps their completions.
pub struct NetBridge {
    transport: Arc<dyn Transport>,
    sender: Sender<Completion>,
    next_token: u64,
}

impl NetBridge {
    /// Create a bridge over `transport`, returning the completion
    /// receiver for the host loop.
    pub fn new(transport: Arc<dyn Transport>) -> (Self, Receiver<Completion>) {
        let (sender, receiver) = channel();
        (
            Self {
                transport,
                sender,
                next_token: 0,
            },
            receiver,
        )
    }

    /// Start a background fetch; the completion arrives on the channel.
    pub fn fetch(&mut self, request: TransportRequest) -> FetchToken {
        self.next_token += 1;
        let token = FetchToken(self.next_token);
        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();

        let spawned = std::thread::Builder::new()
            .name("lumo-fetch".to_string())
            .spawn(move || {
                let outcome = match transport.fetch(&request) {
                    Ok(response) => FetchOutcome::Response(response),
                    Err(TransportError::Aborted) => FetchOutcome::Aborted,
                    Err(err) => FetchOutcome::Failed(err),
                };
                // The receiver only disappears at host teardown; nothing
                // to do with a completion then.
                let _ = sender.send(Completion { token, outcome });
            });

        if let Err(err) = spawned {
            warn_once("net", &format!("failed to spawn fetch thread: {err}"));
            let _ = self.sender.send(Completion {
                token,
                outcome: FetchOutcome::Failed(TransportError::Network(err.to_string())),
            });
        }
        token
    }
}

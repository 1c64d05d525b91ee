//! Asynchronous network bridge for the Lumo script host.
//!
//! Three pieces:
//!
//! - [`xhr`] — the XMLHttpRequest state machine. Pure state; transitions
//!   return the callback events the embedding layer dispatches.
//! - [`transport`]/[`bridge`] — the blocking [`Transport`] seam and the
//!   background-thread executor that funnels every completion through a
//!   single mpsc channel into the host loop.
//! - [`images`] — byte-to-bitmap decoding for image elements (raster,
//!   SVG, `data:` URLs).
//!
//! The one concurrency rule of the whole system lives here: background
//! threads never touch the scripting engine; they only send completions.

pub mod bridge;
pub mod images;
pub mod transport;
pub mod xhr;

pub use bridge::{Completion, FetchOutcome, FetchToken, NetBridge};
pub use transport::{HttpTransport, Transport, TransportError, TransportRequest, TransportResponse};
pub use xhr::{ReadyState, ResponseBody, ResponseType, XhrEvent, XhrRequest};

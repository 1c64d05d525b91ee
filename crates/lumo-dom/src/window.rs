//! The window and location objects.
//!
//! The window carries the configured display dimensions, the live `hash`
//! state, and its own listener map (one listener per event type, like
//! elements). Everything else on location is a static stub — the hosted
//! application runs from a local bundle, not a real origin.

use lumo_common::handle::ScriptHandle;
use std::collections::HashMap;

/// The window object's native state.
#[derive(Debug)]
pub struct Window {
    inner_width: u32,
    inner_height: u32,
    hash: String,
    listeners: HashMap<String, ScriptHandle>,
}

impl Window {
    /// A window reporting the given display size.
    #[must_use]
    pub fn new(inner_width: u32, inner_height: u32) -> Self {
        Self {
            inner_width,
            inner_height,
            hash: String::new(),
            listeners: HashMap::new(),
        }
    }

    /// Fixed display width reported to the script.
    #[must_use]
    pub const fn inner_width(&self) -> u32 {
        self.inner_width
    }

    /// Fixed display height reported to the script.
    #[must_use]
    pub const fn inner_height(&self) -> u32 {
        self.inner_height
    }

    /// The current location hash.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Set the hash, returning the `hashchange` listener the caller
    /// should invoke (the one live field on location).
    pub fn set_hash(&mut self, hash: &str) -> Option<ScriptHandle> {
        self.hash = hash.to_string();
        self.listeners.get("hashchange").copied()
    }

    /// Register a window listener, returning the replaced handle.
    pub fn set_listener(&mut self, event: &str, handle: ScriptHandle) -> Option<ScriptHandle> {
        self.listeners.insert(event.to_string(), handle)
    }

    /// Remove a window listener, returning its handle.
    pub fn remove_listener(&mut self, event: &str) -> Option<ScriptHandle> {
        self.listeners.remove(event)
    }

    /// Look up a window listener.
    #[must_use]
    pub fn listener(&self, event: &str) -> Option<ScriptHandle> {
        self.listeners.get(event).copied()
    }
}

/// Static location fields exposed to the script.
///
/// `hash` is deliberately absent: it routes through
/// [`Window::set_hash`]/[`Window::hash`] so change listeners fire.
#[derive(Debug, Clone)]
pub struct Location {
    /// Always empty.
    pub ancestor_origins: &'static str,
    /// The synthetic local URL.
    pub href: &'static str,
    /// Scheme stub.
    pub protocol: &'static str,
    /// Host stub.
    pub host: &'static str,
    /// Hostname stub.
    pub hostname: &'static str,
    /// Port stub.
    pub port: &'static str,
    /// Path stub.
    pub pathname: &'static str,
    /// Query stub.
    pub search: &'static str,
    /// Origin stub.
    pub origin: &'static str,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            ancestor_origins: "",
            href: "http://local/",
            protocol: "http",
            host: "local",
            hostname: "local",
            port: "",
            pathname: "",
            search: "",
            origin: "",
        }
    }
}

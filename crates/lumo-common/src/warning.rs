//! Host warnings with colored terminal output.
//!
//! Unsupported canvas operations and plumbing hiccups are reported here;
//! each unique message prints once so a 60 Hz draw loop cannot spam the
//! terminal with the same complaint.

use owo_colors::OwoColorize;
use std::collections::HashSet;
use std::sync::{LazyLock, Mutex};

/// Messages already printed, for de-duplication.
static WARNED: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

/// Warn about an unsupported feature or contained internal error.
///
/// Prints once per unique `(component, message)` pair.
///
/// # Panics
///
/// Panics if the warning set mutex is poisoned.
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let first = WARNED.lock().unwrap().insert(key);
    if first {
        eprintln!("{}", format!("[lumo {component}] {message}").yellow());
    }
}

/// Forget all recorded warnings (call when loading a new application).
///
/// # Panics
///
/// Panics if the warning set mutex is poisoned.
pub fn clear_warnings() {
    WARNED.lock().unwrap().clear();
}

//! Shared leaf types for the Lumo script host.
//!
//! Everything here is engine-agnostic: opaque script-value handles, the
//! decoded-bitmap type passed between the network bridge and the canvas,
//! the bundled-resource lookup convention, and de-duplicated warning
//! output.

pub mod bundle;
pub mod handle;
pub mod image;
pub mod warning;

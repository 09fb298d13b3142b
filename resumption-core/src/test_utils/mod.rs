//! In-memory helpers for testing computations and drivers.
//!
//! Available behind the `test-utils` feature flag.

mod abort_probe;
mod scripted_resolver;

pub use abort_probe::AbortProbe;
pub use scripted_resolver::ScriptedResolver;

#![deny(missing_docs)]
//! Execution driver for resumable data computations.
//!
//! [`Executor`] steps a [`DataTask`](resumption_core::DataTask), hands each
//! batch it blocks on to a [`Resolver`](resumption_core::Resolver), and
//! resumes it with the response until it finishes. Runs are bounded by an
//! [`ExecConfig`] (round count and per-round deadline) and traced with
//! `tracing` events under the `resumption.*` names.

mod config;
mod executor;

pub use config::ExecConfig;
pub use executor::{ExecError, ExecTrace, Executor, RoundRecord};

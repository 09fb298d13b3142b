#![deny(missing_docs)]
//! In-process [`Resolver`](resumption_core::Resolver) for resumable data
//! computations.
//!
//! [`LocalResolver`] looks up each request's source in a [`SourceRegistry`]
//! and runs independent (source, group) lanes concurrently with
//! `tokio::spawn`. No durability and no retries: a failing request fails
//! the round.

mod registry;
mod resolver;
mod source;

pub use registry::SourceRegistry;
pub use resolver::LocalResolver;
pub use source::{Source, SourceError};

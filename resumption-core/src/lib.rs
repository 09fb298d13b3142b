//! # resumption-core — resumable data computations
//!
//! Logic that needs data from external stores describes what it needs as
//! [`Request`]s instead of fetching eagerly. A [`DataTask`] is stepped until
//! it either finishes or blocks on a [`Batch`] of requests; the caller has
//! the batch fulfilled by a [`Resolver`] and resumes the task with the
//! [`Response`]. Combinators merge the batches of independent computations
//! so that many data needs collapse into one round trip.
//!
//! | Piece | Types | What it does |
//! |-------|-------|-------------|
//! | Requests | [`Request`], [`Batch`], [`Response`], [`Shape`] | What to fetch, grouped per round |
//! | Protocol | [`Step`], [`Pending`], [`Continuation`] | Outcome of advancing a computation |
//! | Algebra | [`DataTask`], [`fetch`] | `ready`, `and_then`, `zip_with`, ... |
//! | Aggregator | [`sum`], [`collect`] | N-way fan-out/fan-in with batching |
//! | Boundary | [`Resolver`] | Fulfills a batch |
//!
//! Stepping and resuming are synchronous, CPU-only and never perform I/O.
//! Failures are values ([`TaskError`]) threaded through every step and
//! resume; a response that does not fit its batch is rejected with
//! [`ShapeMismatch`] rather than misread.
//!
//! ```
//! use resumption_core::{DataTask, Request, Response, Step, sum};
//! use serde_json::json;
//!
//! let lookup = |key: &str| DataTask::request(Request::sequenced("kv", json!(key)));
//! let total = sum([lookup("a"), lookup("b")], 0, |acc, v| acc + v.as_i64().unwrap_or(0));
//!
//! let Step::Pending(pending) = total.step().unwrap() else { unreachable!() };
//! assert_eq!(pending.batch().len(), 2);
//!
//! let response = Response::many([Response::one(json!(1)), Response::one(json!(2))]);
//! let next = pending.resume(response).unwrap();
//! assert_eq!(next.step().unwrap().done(), Some(3));
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod id;
pub mod pair;
pub mod request;
pub mod resolver;
pub mod response;
pub mod shape;
pub mod step;
pub mod sum;
pub mod task;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::{ResolveError, ShapeMismatch, TaskError};
pub use id::{GroupId, SourceId};
pub use request::{Batch, Request};
pub use resolver::Resolver;
pub use response::Response;
pub use shape::Shape;
pub use step::{Continuation, Pending, Step};
pub use sum::{collect, sum};
pub use task::{DataTask, fetch};

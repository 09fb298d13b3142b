//! The resolver boundary — how a batch of requests turns into a response.

use crate::error::ResolveError;
use crate::request::Batch;
use crate::response::Response;
use async_trait::async_trait;

/// Fulfills a [`Batch`] against real data sources.
///
/// The returned [`Response`] must have exactly the batch's shape: same
/// arity, same order, one leaf value per leaf request. Beyond that the
/// implementation decides everything — how requests are grouped by source,
/// what runs concurrently, what a payload means. The one ordering rule it
/// must honor: requests sharing a source and a sequencing group are issued
/// to that source in batch order.
///
/// A failed resolve is never retried by the core; the driver treats it as
/// the end of the execution.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Fulfill every request in `batch`.
    async fn resolve(&self, batch: &Batch) -> Result<Response, ResolveError>;
}

//! The adapter contract between a resolver and one kind of data source.

use async_trait::async_trait;
use resumption_core::Request;
use thiserror::Error;

/// Executes leaf requests against one physical store or session.
///
/// This is where payloads get their meaning: the adapter decodes the
/// request payload into real work, runs it, and turns the raw result into
/// the leaf value the computation will receive.
#[async_trait]
pub trait Source: Send + Sync {
    /// Run one request and produce its leaf value.
    async fn execute(&self, request: &Request) -> Result<serde_json::Value, SourceError>;
}

/// Source adapter errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SourceError {
    /// The payload does not describe work this source understands.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The work ran and failed.
    #[error("execution failed: {0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

//! Error types for stepping, resuming and resolving computations.

use crate::shape::Shape;
use thiserror::Error;

/// A response did not have the shape of the batch it was supposed to answer.
///
/// Order is the only correlation key between a batch and its response, so
/// a shape disagreement means the leaves cannot be matched back safely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response shape {found} does not match batch shape {expected}")]
pub struct ShapeMismatch {
    /// The shape of the batch that was sent.
    pub expected: Shape,
    /// The shape of the response that came back.
    pub found: Shape,
}

/// Failures raised while stepping or resuming a computation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TaskError {
    /// Stepping one sibling of a composite computation failed.
    #[error("step failed for sibling {index}: {source}")]
    Step {
        /// Position of the sibling among the composite's original children.
        index: usize,
        /// What the sibling raised.
        source: Box<TaskError>,
    },

    /// Resuming one sibling of a composite computation failed.
    #[error("resume failed for sibling {index}: {source}")]
    Resume {
        /// Position of the sibling among the composite's original children.
        index: usize,
        /// What the sibling raised.
        source: Box<TaskError>,
    },

    /// One or more siblings failed in the same round. Causes are listed in
    /// sibling order and are [`TaskError::Step`] or [`TaskError::Resume`].
    #[error("{} sibling computation(s) failed: {}", .0.len(), list(.0))]
    Aggregate(Vec<TaskError>),

    /// A continuation was handed a response that does not fit its batch.
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),

    /// A leaf response could not be decoded into the expected type.
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The computation's own logic refused to continue.
    #[error("{0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TaskError {
    /// Shorthand for [`TaskError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// The per-sibling causes of an aggregate failure, or the error itself.
    pub fn causes(&self) -> &[TaskError] {
        match self {
            Self::Aggregate(causes) => causes,
            other => std::slice::from_ref(other),
        }
    }

    /// Sibling index carried by a step or resume failure.
    pub fn sibling(&self) -> Option<usize> {
        match self {
            Self::Step { index, .. } | Self::Resume { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// True if this error, or any cause beneath it, is a shape mismatch.
    pub fn is_shape_mismatch(&self) -> bool {
        match self {
            Self::ShapeMismatch(_) => true,
            Self::Step { source, .. } | Self::Resume { source, .. } => source.is_shape_mismatch(),
            Self::Aggregate(causes) => causes.iter().any(TaskError::is_shape_mismatch),
            _ => false,
        }
    }
}

fn list(causes: &[TaskError]) -> String {
    causes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures raised by a [`Resolver`](crate::Resolver) while fulfilling a batch.
///
/// The driver treats every resolver failure as unrecovered for the round.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No adapter is registered for the request's source.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A source adapter failed to execute a request.
    #[error("source {source_id} failed: {message}")]
    Source {
        /// The source that failed.
        source_id: String,
        /// Error message.
        message: String,
    },

    /// Dispatching work to a source failed before it could run.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// The resolver could not build a response matching the batch.
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

//! AbortProbe — pending computations whose abort is observable.

use crate::error::TaskError;
use crate::request::{Batch, Request};
use crate::step::Pending;
use crate::task::DataTask;
use std::sync::{Arc, Mutex, PoisonError};

/// Hands out request tasks that record the cause whenever they are
/// aborted. Clones share the same record.
#[derive(Clone, Default)]
pub struct AbortProbe {
    causes: Arc<Mutex<Vec<String>>>,
}

impl AbortProbe {
    /// Create a probe with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// A computation blocked on `request` that finishes with the leaf
    /// value, and records the cause if it is aborted instead.
    pub fn request(&self, request: Request) -> DataTask<serde_json::Value> {
        let causes = Arc::clone(&self.causes);
        DataTask::pending(
            Pending::new(Batch::One(request), |response| {
                Ok(DataTask::ready(response.into_one()?))
            })
            .with_abort(move |cause: &TaskError| {
                causes
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(cause.to_string());
            }),
        )
    }

    /// Number of aborts recorded.
    pub fn aborted(&self) -> usize {
        self.causes().len()
    }

    /// The display form of every abort cause, in order.
    pub fn causes(&self) -> Vec<String> {
        self.causes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

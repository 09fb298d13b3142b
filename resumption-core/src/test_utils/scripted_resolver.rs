//! ScriptedResolver — answers every leaf request with a closure.

use crate::error::ResolveError;
use crate::request::{Batch, Request};
use crate::resolver::Resolver;
use crate::response::Response;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

type Answer = dyn Fn(&Request) -> Result<serde_json::Value, ResolveError> + Send + Sync;

/// A resolver that answers each leaf with a closure and records every
/// batch it was handed. Use `.calls()` to count round trips.
pub struct ScriptedResolver {
    answer: Box<Answer>,
    batches: Mutex<Vec<Batch>>,
}

impl ScriptedResolver {
    /// Answer every request with `answer`.
    pub fn new<F>(answer: F) -> Self
    where
        F: Fn(&Request) -> Result<serde_json::Value, ResolveError> + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with its own payload.
    pub fn echo() -> Self {
        Self::new(|request| Ok(request.payload.clone()))
    }

    /// Number of `resolve` calls so far.
    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// A snapshot of every batch received, in call order.
    pub fn batches(&self) -> Vec<Batch> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, batch: &Batch) -> Result<Response, ResolveError> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.clone());
        let values = batch
            .requests()
            .into_iter()
            .map(|request| (self.answer)(request))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Response::assemble(batch, values)?)
    }
}

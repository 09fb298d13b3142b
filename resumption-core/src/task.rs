//! [`DataTask`], the resumable computation, and its sequential combinators.

use crate::error::TaskError;
use crate::request::{Batch, Request};
use crate::step::{Pending, Step};
use serde::de::DeserializeOwned;
use std::fmt;

type StepFn<T> = Box<dyn FnOnce() -> Result<Step<T>, TaskError> + Send>;

/// A computation that may need data before it can finish.
///
/// A `DataTask` does nothing until it is stepped. Stepping consumes it and
/// yields either the final value or a [`Pending`] state naming the requests
/// it is blocked on; resuming that state produces the next `DataTask`.
/// Because every stage is consumed by value, an earlier stage can never be
/// observed in a half-advanced state.
///
/// Stepping is synchronous and never performs I/O: all external work is
/// expressed as requests and left to the caller.
pub struct DataTask<T> {
    inner: Inner<T>,
}

enum Inner<T> {
    Ready(T),
    Failed(TaskError),
    Blocked(Pending<T>),
    Deferred(StepFn<T>),
}

impl<T: Send + 'static> DataTask<T> {
    /// A computation that is already finished.
    pub fn ready(value: T) -> Self {
        Self {
            inner: Inner::Ready(value),
        }
    }

    /// A computation that fails as soon as it is stepped.
    pub fn fail(error: TaskError) -> Self {
        Self {
            inner: Inner::Failed(error),
        }
    }

    /// A computation that is blocked on `pending`.
    pub fn pending(pending: Pending<T>) -> Self {
        Self {
            inner: Inner::Blocked(pending),
        }
    }

    /// The lowest-level constructor: `step` runs when this task is stepped.
    pub fn from_step<F>(step: F) -> Self
    where
        F: FnOnce() -> Result<Step<T>, TaskError> + Send + 'static,
    {
        Self {
            inner: Inner::Deferred(Box::new(step)),
        }
    }

    /// Build the computation lazily, when it is first stepped.
    pub fn defer<F>(build: F) -> Self
    where
        F: FnOnce() -> DataTask<T> + Send + 'static,
    {
        Self::from_step(move || build().step())
    }

    /// Advance the computation as far as it can go without external data.
    pub fn step(self) -> Result<Step<T>, TaskError> {
        match self.inner {
            Inner::Ready(value) => Ok(Step::Done(value)),
            Inner::Failed(error) => Err(error),
            Inner::Blocked(pending) => Ok(Step::Pending(pending)),
            Inner::Deferred(step) => step(),
        }
    }

    /// Release whatever this computation would block on, without running
    /// it to completion.
    ///
    /// The task is stepped once; if that exposes a pending state, the
    /// pending state is aborted. A result or a step error is dropped.
    pub fn abort(self, cause: &TaskError) {
        if let Ok(Step::Pending(pending)) = self.step() {
            pending.abort(cause);
        }
    }

    /// Sequential composition: once this computation finishes, continue
    /// with the computation `f` builds from its value.
    ///
    /// `f` runs at most once, and nothing it requests is issued before
    /// this computation has finished.
    pub fn and_then<U, F>(self, f: F) -> DataTask<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> DataTask<U> + Send + 'static,
    {
        DataTask::from_step(move || match self.step()? {
            Step::Done(value) => f(value).step(),
            Step::Pending(pending) => Ok(Step::Pending(pending.and_then(f))),
        })
    }

    /// Transform the final value.
    pub fn map<U, F>(self, f: F) -> DataTask<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.and_then(move |value| DataTask::ready(f(value)))
    }

    /// Transform the final value with a step that may fail.
    pub fn try_map<U, F>(self, f: F) -> DataTask<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, TaskError> + Send + 'static,
    {
        self.and_then(move |value| match f(value) {
            Ok(mapped) => DataTask::ready(mapped),
            Err(error) => DataTask::fail(error),
        })
    }

    /// Run `next` after this computation, discarding this one's value.
    pub fn then<U>(self, next: DataTask<U>) -> DataTask<U>
    where
        U: Send + 'static,
    {
        self.and_then(move |_| next)
    }
}

impl DataTask<serde_json::Value> {
    /// A computation that issues `request` and finishes with the raw
    /// leaf value the resolver returns for it.
    pub fn request(request: Request) -> Self {
        Self::pending(Pending::new(Batch::One(request), |response| {
            Ok(DataTask::ready(response.into_one()?))
        }))
    }
}

/// Issue `request` and decode the answer as `T`.
pub fn fetch<T>(request: Request) -> DataTask<T>
where
    T: DeserializeOwned + Send + 'static,
{
    DataTask::request(request).try_map(|value| Ok(serde_json::from_value(value)?))
}

impl<T: Send + 'static> From<Pending<T>> for DataTask<T> {
    fn from(pending: Pending<T>) -> Self {
        Self::pending(pending)
    }
}

impl<T: fmt::Debug> fmt::Debug for DataTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Ready(value) => f.debug_tuple("DataTask::Ready").field(value).finish(),
            Inner::Failed(error) => f.debug_tuple("DataTask::Failed").field(error).finish(),
            Inner::Blocked(pending) => f.debug_tuple("DataTask::Blocked").field(pending).finish(),
            Inner::Deferred(_) => f.write_str("DataTask::Deferred"),
        }
    }
}

//! The outcome of advancing a computation, and the pending state it can block on.

use crate::error::TaskError;
use crate::request::Batch;
use crate::response::Response;
use crate::shape::Shape;
use crate::task::DataTask;
use std::fmt;

/// What stepping a [`DataTask`] produced.
pub enum Step<T> {
    /// The computation finished.
    Done(T),
    /// The computation is blocked on a batch of requests.
    Pending(Pending<T>),
}

impl<T> Step<T> {
    /// True for [`Step::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// True for [`Step::Pending`].
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The final value, if the computation finished.
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Pending(_) => None,
        }
    }

    /// The pending state, if the computation is blocked.
    pub fn pending(self) -> Option<Pending<T>> {
        match self {
            Self::Done(_) => None,
            Self::Pending(pending) => Some(pending),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Step<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(value) => f.debug_tuple("Done").field(value).finish(),
            Self::Pending(pending) => f.debug_tuple("Pending").field(pending).finish(),
        }
    }
}

/// Resumes a blocked computation once its batch has been answered.
///
/// Consumed by value: a continuation runs at most once, and either
/// `resume` or `abort` is called, never both.
pub trait Continuation<T>: Send {
    /// Continue with the answer to the batch this continuation was paired
    /// with. When reached through [`Pending::resume`] the response has
    /// already been checked against that batch.
    fn resume(self: Box<Self>, response: Response) -> Result<DataTask<T>, TaskError>;

    /// Release whatever the outstanding batch holds, without producing a
    /// result. Called when a sibling failed and this continuation will
    /// never be resumed. Must not fail.
    fn abort(self: Box<Self>, _cause: &TaskError) {}
}

/// Resume a child continuation whose batch was merged into a larger one,
/// checking its slice of the response against the shape it was blocked on.
/// On a mismatch the child is aborted instead of resumed.
pub(crate) fn resume_child<T>(
    continuation: Box<dyn Continuation<T>>,
    expected: &Shape,
    response: Response,
) -> Result<DataTask<T>, TaskError> {
    if let Err(mismatch) = expected.check(&response) {
        let cause = TaskError::from(mismatch);
        continuation.abort(&cause);
        return Err(cause);
    }
    continuation.resume(response)
}

/// A computation blocked on `batch`, plus how to continue it.
pub struct Pending<T> {
    batch: Batch,
    continuation: Box<dyn Continuation<T>>,
}

impl<T: 'static> Pending<T> {
    /// Block on `batch` and continue with `resume` once it is answered.
    pub fn new<F>(batch: Batch, resume: F) -> Self
    where
        F: FnOnce(Response) -> Result<DataTask<T>, TaskError> + Send + 'static,
    {
        Self::from_continuation(batch, Box::new(FnContinuation(resume)))
    }

    /// Block on `batch` with a hand-written continuation.
    pub fn from_continuation(batch: Batch, continuation: Box<dyn Continuation<T>>) -> Self {
        Self {
            batch,
            continuation,
        }
    }

    /// Run `hook` if this pending state is aborted. The existing abort
    /// behavior still runs afterwards.
    pub fn with_abort<A>(self, hook: A) -> Self
    where
        A: FnOnce(&TaskError) + Send + 'static,
    {
        Self {
            batch: self.batch,
            continuation: Box::new(AbortHook {
                inner: self.continuation,
                hook,
            }),
        }
    }

    /// The outstanding batch.
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Split into the batch and its continuation. Used by combinators that
    /// merge several batches into one and resume the parts themselves.
    pub fn into_parts(self) -> (Batch, Box<dyn Continuation<T>>) {
        (self.batch, self.continuation)
    }

    /// Continue with the answer to [`Pending::batch`].
    ///
    /// Fails with [`TaskError::ShapeMismatch`] before running the
    /// continuation if `response` does not have the batch's shape.
    pub fn resume(self, response: Response) -> Result<DataTask<T>, TaskError> {
        self.batch.check(&response)?;
        self.continuation.resume(response)
    }

    /// Give up on this pending state, releasing what it holds.
    pub fn abort(self, cause: &TaskError) {
        self.continuation.abort(cause);
    }

    pub(crate) fn and_then<U, F>(self, f: F) -> Pending<U>
    where
        T: Send,
        U: Send + 'static,
        F: FnOnce(T) -> DataTask<U> + Send + 'static,
    {
        Pending {
            batch: self.batch,
            continuation: Box::new(Bind {
                inner: self.continuation,
                f,
            }),
        }
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

struct FnContinuation<F>(F);

impl<T, F> Continuation<T> for FnContinuation<F>
where
    F: FnOnce(Response) -> Result<DataTask<T>, TaskError> + Send,
{
    fn resume(self: Box<Self>, response: Response) -> Result<DataTask<T>, TaskError> {
        (self.0)(response)
    }
}

struct AbortHook<T, A> {
    inner: Box<dyn Continuation<T>>,
    hook: A,
}

impl<T, A> Continuation<T> for AbortHook<T, A>
where
    A: FnOnce(&TaskError) + Send,
{
    fn resume(self: Box<Self>, response: Response) -> Result<DataTask<T>, TaskError> {
        self.inner.resume(response)
    }

    fn abort(self: Box<Self>, cause: &TaskError) {
        let AbortHook { inner, hook } = *self;
        hook(cause);
        inner.abort(cause);
    }
}

// Sequential composition: resuming the inner continuation yields a task
// that is then chained into `f`.
struct Bind<T, F> {
    inner: Box<dyn Continuation<T>>,
    f: F,
}

impl<T, U, F> Continuation<U> for Bind<T, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> DataTask<U> + Send + 'static,
{
    fn resume(self: Box<Self>, response: Response) -> Result<DataTask<U>, TaskError> {
        let Bind { inner, f } = *self;
        Ok(inner.resume(response)?.and_then(f))
    }

    fn abort(self: Box<Self>, cause: &TaskError) {
        self.inner.abort(cause);
    }
}

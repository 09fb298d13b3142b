//! The N-way aggregator: step many siblings together, batch whatever they
//! are blocked on, and fold their results as they finish.

use crate::error::TaskError;
use crate::request::Batch;
use crate::response::Response;
use crate::shape::Shape;
use crate::step::{Continuation, Pending, Step, resume_child};
use crate::task::DataTask;

/// Fold the results of `tasks` into `init` with `add`.
///
/// Every round, all unfinished siblings are stepped in order before
/// anything is dispatched. Finished results are folded in sibling order
/// within a round, and in round order across rounds. The requests of every
/// blocked sibling are merged into one batch (a single blocked sibling's
/// batch is used as-is), so the number of round trips is bounded by the
/// deepest sibling rather than by the number of siblings.
///
/// If any sibling fails to step, every sibling that blocked in the same
/// round is aborted and the result is a [`TaskError::Aggregate`] of
/// [`TaskError::Step`] causes in sibling order. Resume failures are
/// reported the same way with [`TaskError::Resume`], after aborting the
/// siblings that resumed fine. Sibling indices always refer to positions
/// in the original `tasks`.
pub fn sum<T, S, F, I>(tasks: I, init: S, add: F) -> DataTask<S>
where
    I: IntoIterator<Item = DataTask<T>>,
    T: Send + 'static,
    S: Send + 'static,
    F: FnMut(S, T) -> S + Send + 'static,
{
    Sum {
        siblings: tasks.into_iter().enumerate().collect(),
        acc: init,
        add,
    }
    .into_task()
}

/// Run all `tasks` together and collect their values in sibling order.
pub fn collect<T, I>(tasks: I) -> DataTask<Vec<T>>
where
    I: IntoIterator<Item = DataTask<T>>,
    T: Send + 'static,
{
    let tasks: Vec<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| task.map(move |value| (index, value)))
        .collect();
    let len = tasks.len();
    sum(tasks, Vec::with_capacity(len), |mut acc, item| {
        acc.push(item);
        acc
    })
    .map(|mut items: Vec<(usize, T)>| {
        items.sort_by_key(|(index, _)| *index);
        items.into_iter().map(|(_, value)| value).collect::<Vec<_>>()
    })
}

struct Sum<T, S, F> {
    siblings: Vec<(usize, DataTask<T>)>,
    acc: S,
    add: F,
}

impl<T, S, F> Sum<T, S, F>
where
    T: Send + 'static,
    S: Send + 'static,
    F: FnMut(S, T) -> S + Send + 'static,
{
    fn into_task(self) -> DataTask<S> {
        DataTask::from_step(move || self.step())
    }

    fn step(self) -> Result<Step<S>, TaskError> {
        let Sum {
            siblings,
            mut acc,
            mut add,
        } = self;

        let mut stepped = Vec::with_capacity(siblings.len());
        let mut failed = Vec::new();
        for (index, task) in siblings {
            match task.step() {
                Ok(step) => stepped.push((index, step)),
                Err(error) => failed.push(TaskError::Step {
                    index,
                    source: Box::new(error),
                }),
            }
        }

        if !failed.is_empty() {
            let cause = TaskError::Aggregate(failed);
            for (_, step) in stepped {
                if let Step::Pending(pending) = step {
                    pending.abort(&cause);
                }
            }
            return Err(cause);
        }

        let mut batches = Vec::new();
        let mut waiting = Vec::new();
        for (index, step) in stepped {
            match step {
                Step::Done(value) => acc = add(acc, value),
                Step::Pending(pending) => {
                    let (batch, continuation) = pending.into_parts();
                    waiting.push((index, batch.shape(), continuation));
                    batches.push(batch);
                }
            }
        }

        if waiting.is_empty() {
            return Ok(Step::Done(acc));
        }

        let batch = if batches.len() == 1 {
            batches.remove(0)
        } else {
            Batch::Many(batches)
        };
        Ok(Step::Pending(Pending::from_continuation(
            batch,
            Box::new(SumContinuation { waiting, acc, add }),
        )))
    }
}

struct SumContinuation<T, S, F> {
    waiting: Vec<(usize, Shape, Box<dyn Continuation<T>>)>,
    acc: S,
    add: F,
}

impl<T, S, F> Continuation<S> for SumContinuation<T, S, F>
where
    T: Send + 'static,
    S: Send + 'static,
    F: FnMut(S, T) -> S + Send + 'static,
{
    fn resume(self: Box<Self>, response: Response) -> Result<DataTask<S>, TaskError> {
        let SumContinuation { waiting, acc, add } = *self;

        let slices = if waiting.len() == 1 {
            vec![response]
        } else {
            match response.into_many(waiting.len()) {
                Ok(slices) => slices,
                Err(mismatch) => {
                    let cause = TaskError::from(mismatch);
                    for (_, _, continuation) in waiting {
                        continuation.abort(&cause);
                    }
                    return Err(cause);
                }
            }
        };

        let mut resumed = Vec::with_capacity(waiting.len());
        let mut failed = Vec::new();
        for ((index, shape, continuation), slice) in waiting.into_iter().zip(slices) {
            match resume_child(continuation, &shape, slice) {
                Ok(task) => resumed.push((index, task)),
                Err(error) => failed.push(TaskError::Resume {
                    index,
                    source: Box::new(error),
                }),
            }
        }

        if !failed.is_empty() {
            let cause = TaskError::Aggregate(failed);
            for (_, task) in resumed {
                task.abort(&cause);
            }
            return Err(cause);
        }

        Ok(Sum {
            siblings: resumed,
            acc,
            add,
        }
        .into_task())
    }

    fn abort(self: Box<Self>, cause: &TaskError) {
        for (_, _, continuation) in self.waiting {
            continuation.abort(cause);
        }
    }
}

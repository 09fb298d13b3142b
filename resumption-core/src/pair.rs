//! Independent composition of two computations.

use crate::error::TaskError;
use crate::request::Batch;
use crate::response::Response;
use crate::shape::Shape;
use crate::step::{Continuation, Pending, Step, resume_child};
use crate::task::DataTask;

impl<A: Send + 'static> DataTask<A> {
    /// Run this computation and `other` side by side, then merge their
    /// values with `combine`.
    ///
    /// Both sides are stepped in the same round. When both are blocked,
    /// their batches travel together as `[left, right]`; when only one is,
    /// its batch is passed through unchanged. A failure names the side
    /// (0 for `self`, 1 for `other`) inside a [`TaskError::Aggregate`],
    /// and a still-pending side is aborted before the failure is returned.
    pub fn zip_with<B, C, F>(self, other: DataTask<B>, combine: F) -> DataTask<C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: FnOnce(A, B) -> C + Send + 'static,
    {
        DataTask::from_step(move || step_pair(self, other, combine))
    }

    /// [`DataTask::zip_with`] into a tuple.
    pub fn zip<B>(self, other: DataTask<B>) -> DataTask<(A, B)>
    where
        B: Send + 'static,
    {
        self.zip_with(other, |a, b| (a, b))
    }
}

enum Side<X> {
    Done(X),
    Waiting(Shape, Box<dyn Continuation<X>>),
}

fn step_pair<A, B, C, F>(
    left: DataTask<A>,
    right: DataTask<B>,
    combine: F,
) -> Result<Step<C>, TaskError>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: FnOnce(A, B) -> C + Send + 'static,
{
    let (left, right, batch) = match (left.step(), right.step()) {
        (Ok(Step::Done(a)), Ok(Step::Done(b))) => return Ok(Step::Done(combine(a, b))),
        (Ok(Step::Pending(a)), Ok(Step::Pending(b))) => {
            let (batch_a, a) = a.into_parts();
            let (batch_b, b) = b.into_parts();
            (
                Side::Waiting(batch_a.shape(), a),
                Side::Waiting(batch_b.shape(), b),
                Batch::Many(vec![batch_a, batch_b]),
            )
        }
        (Ok(Step::Pending(a)), Ok(Step::Done(b))) => {
            let (batch, a) = a.into_parts();
            (Side::Waiting(batch.shape(), a), Side::Done(b), batch)
        }
        (Ok(Step::Done(a)), Ok(Step::Pending(b))) => {
            let (batch, b) = b.into_parts();
            (Side::Done(a), Side::Waiting(batch.shape(), b), batch)
        }
        (left, right) => {
            let mut causes = Vec::with_capacity(2);
            let left = step_failure(left, 0, &mut causes);
            let right = step_failure(right, 1, &mut causes);
            let cause = TaskError::Aggregate(causes);
            if let Some(pending) = left {
                pending.abort(&cause);
            }
            if let Some(pending) = right {
                pending.abort(&cause);
            }
            return Err(cause);
        }
    };

    Ok(Step::Pending(Pending::from_continuation(
        batch,
        Box::new(PairContinuation {
            left,
            right,
            combine,
        }),
    )))
}

fn step_failure<X>(
    outcome: Result<Step<X>, TaskError>,
    index: usize,
    causes: &mut Vec<TaskError>,
) -> Option<Pending<X>> {
    match outcome {
        Ok(Step::Pending(pending)) => Some(pending),
        Ok(Step::Done(_)) => None,
        Err(error) => {
            causes.push(TaskError::Step {
                index,
                source: Box::new(error),
            });
            None
        }
    }
}

fn resume_side<X: Send + 'static>(
    continuation: Box<dyn Continuation<X>>,
    shape: &Shape,
    response: Response,
    index: usize,
    causes: &mut Vec<TaskError>,
) -> Option<DataTask<X>> {
    match resume_child(continuation, shape, response) {
        Ok(task) => Some(task),
        Err(error) => {
            causes.push(TaskError::Resume {
                index,
                source: Box::new(error),
            });
            None
        }
    }
}

struct PairContinuation<A, B, F> {
    left: Side<A>,
    right: Side<B>,
    combine: F,
}

impl<A, B, C, F> Continuation<C> for PairContinuation<A, B, F>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: FnOnce(A, B) -> C + Send + 'static,
{
    fn resume(self: Box<Self>, response: Response) -> Result<DataTask<C>, TaskError> {
        let PairContinuation {
            left,
            right,
            combine,
        } = *self;
        let mut causes = Vec::new();

        let (left, right) = match (left, right) {
            (Side::Waiting(shape_a, a), Side::Waiting(shape_b, b)) => {
                let (response_a, response_b) = match response.into_pair() {
                    Ok(parts) => parts,
                    Err(mismatch) => {
                        let cause = TaskError::from(mismatch);
                        a.abort(&cause);
                        b.abort(&cause);
                        return Err(cause);
                    }
                };
                (
                    resume_side(a, &shape_a, response_a, 0, &mut causes),
                    resume_side(b, &shape_b, response_b, 1, &mut causes),
                )
            }
            (Side::Waiting(shape, a), Side::Done(b)) => (
                resume_side(a, &shape, response, 0, &mut causes),
                Some(DataTask::ready(b)),
            ),
            (Side::Done(a), Side::Waiting(shape, b)) => (
                Some(DataTask::ready(a)),
                resume_side(b, &shape, response, 1, &mut causes),
            ),
            (Side::Done(a), Side::Done(b)) => (Some(DataTask::ready(a)), Some(DataTask::ready(b))),
        };

        match (left, right) {
            (Some(left), Some(right)) if causes.is_empty() => Ok(left.zip_with(right, combine)),
            (left, right) => {
                let cause = TaskError::Aggregate(causes);
                if let Some(task) = left {
                    task.abort(&cause);
                }
                if let Some(task) = right {
                    task.abort(&cause);
                }
                Err(cause)
            }
        }
    }

    fn abort(self: Box<Self>, cause: &TaskError) {
        let PairContinuation { left, right, .. } = *self;
        if let Side::Waiting(_, a) = left {
            a.abort(cause);
        }
        if let Side::Waiting(_, b) = right {
            b.abort(cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn req(n: u32) -> Request {
        Request::sequenced("db", json!(n))
    }

    fn number(n: u32) -> DataTask<u64> {
        DataTask::request(req(n)).try_map(|v| Ok(serde_json::from_value(v)?))
    }

    #[test]
    fn both_ready_combine_immediately() {
        let task = DataTask::ready(2).zip_with(DataTask::ready(3), |a, b| a * b);
        assert_eq!(task.step().unwrap().done(), Some(6));
    }

    #[test]
    fn both_pending_share_one_batch() {
        let pending = number(1).zip(number(2)).step().unwrap().pending().unwrap();
        assert_eq!(
            pending.batch(),
            &Batch::many([Batch::one(req(1)), Batch::one(req(2))])
        );
        let next = pending
            .resume(Response::many([Response::one(json!(10)), Response::one(json!(20))]))
            .unwrap();
        assert_eq!(next.step().unwrap().done(), Some((10, 20)));
    }

    #[test]
    fn lone_pending_side_is_not_wrapped() {
        let pending = DataTask::ready(1u64)
            .zip_with(number(7), |a, b| a + b)
            .step()
            .unwrap()
            .pending()
            .unwrap();
        assert_eq!(pending.batch(), &Batch::one(req(7)));
        let next = pending.resume(Response::one(json!(41))).unwrap();
        assert_eq!(next.step().unwrap().done(), Some(42));
    }

    #[test]
    fn uneven_depths_take_extra_rounds() {
        let deep = number(1).and_then(|n| number(n as u32));
        let pending = deep.zip(number(2)).step().unwrap().pending().unwrap();
        let next = pending
            .resume(Response::many([Response::one(json!(5)), Response::one(json!(6))]))
            .unwrap();
        let pending = next.step().unwrap().pending().unwrap();
        assert_eq!(pending.batch(), &Batch::one(req(5)));
        let done = pending.resume(Response::one(json!(50))).unwrap();
        assert_eq!(done.step().unwrap().done(), Some((50, 6)));
    }

    #[test]
    fn failing_side_is_named_and_other_side_aborted() {
        let causes = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&causes);
        let blocked = DataTask::pending(
            Pending::new(Batch::one(req(1)), |_| Ok(DataTask::ready(0u64))).with_abort(
                move |cause| seen.lock().unwrap().push(cause.to_string()),
            ),
        );
        let err = blocked
            .zip(DataTask::<u64>::fail(TaskError::failed("boom")))
            .step()
            .unwrap_err();
        assert_eq!(err.causes().len(), 1);
        assert_eq!(err.causes()[0].sibling(), Some(1));
        assert_eq!(causes.lock().unwrap().len(), 1);
    }

    #[test]
    fn both_sides_failing_aggregate_both_causes() {
        let err = DataTask::<u8>::fail(TaskError::failed("left"))
            .zip(DataTask::<u8>::fail(TaskError::failed("right")))
            .step()
            .unwrap_err();
        let indices: Vec<_> = err.causes().iter().filter_map(TaskError::sibling).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    fn recording(n: u32, log: &Arc<Mutex<Vec<String>>>) -> DataTask<u64> {
        let log = Arc::clone(log);
        DataTask::pending(
            Pending::new(Batch::one(req(n)), |_| Ok(DataTask::ready(0u64)))
                .with_abort(move |cause| log.lock().unwrap().push(cause.to_string())),
        )
    }

    #[test]
    fn resume_failure_names_side_and_aborts_the_other() {
        let aborts = Arc::new(Mutex::new(Vec::new()));
        // Resumes fine, then blocks again on a follow-up request.
        let left = {
            let aborts = Arc::clone(&aborts);
            number(0).and_then(move |_| recording(9, &aborts))
        };
        let bad = DataTask::pending(Pending::new(Batch::one(req(1)), |_| {
            Err::<DataTask<u64>, _>(TaskError::failed("cannot resume"))
        }));
        let pending = left.zip(bad).step().unwrap().pending().unwrap();
        let err = pending
            .resume(Response::many([Response::one(json!(1)), Response::one(json!(2))]))
            .unwrap_err();

        assert!(matches!(err.causes(), [TaskError::Resume { index: 1, .. }]));
        let aborts = aborts.lock().unwrap();
        assert_eq!(aborts.len(), 1);
        assert!(aborts[0].contains("cannot resume"));
    }

    #[test]
    fn nested_slice_is_checked_before_side_resumes() {
        let ran = Arc::new(Mutex::new(false));
        let aborts = Arc::new(Mutex::new(Vec::new()));
        let both = {
            let ran = Arc::clone(&ran);
            let log = Arc::clone(&aborts);
            DataTask::pending(
                Pending::new(Batch::many([Batch::one(req(1)), Batch::one(req(2))]), move |_| {
                    *ran.lock().unwrap() = true;
                    Ok(DataTask::ready(0u64))
                })
                .with_abort(move |cause| log.lock().unwrap().push(cause.to_string())),
            )
        };
        let (_, continuation) = both
            .zip(recording(3, &aborts))
            .step()
            .unwrap()
            .pending()
            .unwrap()
            .into_parts();

        // Right arity at the top, but the left slice is a leaf instead of [1, 1].
        let err = match continuation.resume(Response::many([
            Response::one(json!(1)),
            Response::one(json!(3)),
        ])) {
            Ok(_) => panic!("expected a shape mismatch"),
            Err(err) => err,
        };

        assert!(err.is_shape_mismatch());
        assert!(matches!(err.causes(), [TaskError::Resume { index: 0, .. }]));
        assert!(!*ran.lock().unwrap());
        assert_eq!(aborts.lock().unwrap().len(), 1);
    }
}

use crate::config::ExecConfig;
use resumption_core::{DataTask, Pending, ResolveError, Resolver, Step, TaskError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::Instrument;

/// Errors returned by [`Executor::run`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecError {
    /// The computation failed while stepping or resuming.
    #[error("computation failed: {0}")]
    Task(#[from] TaskError),
    /// The resolver failed to fulfill a batch.
    #[error("resolver failed: {0}")]
    Resolve(#[from] ResolveError),
    /// The resolver did not answer within the round deadline.
    #[error("round {round} timed out after {limit_ms}ms")]
    Timeout {
        /// The round that overran.
        round: usize,
        /// The configured deadline.
        limit_ms: u64,
    },
    /// The run needed more round trips than the configured bound.
    #[error("execution exceeded max_rounds={0}")]
    RoundLimit(usize),
}

/// One resolver round trip.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: usize,
    /// Leaf requests in the batch.
    pub requests: usize,
    /// Distinct sources the batch touched.
    pub sources: usize,
    /// Time spent inside the resolver.
    pub elapsed: Duration,
}

/// Trace of a single run: every round trip, in order.
#[derive(Debug, Clone, Default)]
pub struct ExecTrace {
    /// Rounds in dispatch order.
    pub rounds: Vec<RoundRecord>,
}

impl ExecTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resolver calls made.
    pub fn round_trips(&self) -> usize {
        self.rounds.len()
    }

    /// Leaf requests dispatched across all rounds.
    pub fn total_requests(&self) -> usize {
        self.rounds.iter().map(|r| r.requests).sum()
    }
}

/// Drives a [`DataTask`] to completion against a [`Resolver`].
///
/// The loop is plain: step, and if the task is blocked, hand its batch to
/// the resolver and resume with the response. All merging of requests
/// already happened inside the task's combinators; the executor never
/// reorders or splits a batch.
///
/// When a round cannot complete (resolver error, deadline, round bound,
/// malformed response) the blocked task is aborted before the error is
/// returned. Nothing is retried.
pub struct Executor<R: Resolver + ?Sized> {
    resolver: Arc<R>,
    config: ExecConfig,
}

impl<R: Resolver + ?Sized> Executor<R> {
    /// Create an executor with the default configuration.
    pub fn new(resolver: Arc<R>) -> Self {
        Self {
            resolver,
            config: ExecConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// The resolver batches are handed to.
    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    /// Run `task` to completion.
    pub async fn run<T: Send + 'static>(&self, task: DataTask<T>) -> Result<T, ExecError> {
        self.run_traced(task).await.map(|(value, _)| value)
    }

    /// Run `task` to completion and report every round trip.
    pub async fn run_traced<T: Send + 'static>(
        &self,
        task: DataTask<T>,
    ) -> Result<(T, ExecTrace), ExecError> {
        let span = tracing::info_span!("resumption.run", max_rounds = self.config.max_rounds);
        async move {
            tracing::debug!("resumption.run.start");
            let mut trace = ExecTrace::new();
            let result = self.drive(task, &mut trace).await;
            match &result {
                Ok(_) => tracing::debug!(
                    rounds = trace.round_trips(),
                    requests = trace.total_requests(),
                    "resumption.run.complete"
                ),
                Err(error) => tracing::warn!(
                    rounds = trace.round_trips(),
                    error = %error,
                    "resumption.run.failed"
                ),
            }
            result.map(|value| (value, trace))
        }
        .instrument(span)
        .await
    }

    async fn drive<T: Send + 'static>(
        &self,
        mut task: DataTask<T>,
        trace: &mut ExecTrace,
    ) -> Result<T, ExecError> {
        loop {
            let pending = match task.step()? {
                Step::Done(value) => return Ok(value),
                Step::Pending(pending) => pending,
            };

            let round = trace.round_trips() + 1;
            if self.config.exceeds(round) {
                return Err(abandon(pending, ExecError::RoundLimit(self.config.max_rounds)));
            }

            let batch = pending.batch();
            let requests = batch.len();
            let sources = batch
                .requests()
                .into_iter()
                .map(|request| &request.source)
                .collect::<HashSet<_>>()
                .len();
            tracing::debug!(round, requests, sources, "resumption.round.dispatch");

            let started = Instant::now();
            let resolved = match self.config.round_timeout() {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.resolver.resolve(batch)).await {
                        Ok(resolved) => resolved.map_err(ExecError::from),
                        Err(_) => Err(ExecError::Timeout {
                            round,
                            limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        }),
                    }
                }
                None => self.resolver.resolve(batch).await.map_err(ExecError::from),
            };
            let elapsed = started.elapsed();

            let response = match resolved {
                Ok(response) => response,
                Err(error) => return Err(abandon(pending, error)),
            };
            if let Err(mismatch) = pending.batch().check(&response) {
                return Err(abandon(pending, TaskError::from(mismatch).into()));
            }

            tracing::debug!(
                round,
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "resumption.round.resolved"
            );
            trace.rounds.push(RoundRecord {
                round,
                requests,
                sources,
                elapsed,
            });
            task = pending.resume(response)?;
        }
    }
}

/// Abort `pending` on behalf of `error` and hand the error back.
fn abandon<T: 'static>(pending: Pending<T>, error: ExecError) -> ExecError {
    match &error {
        ExecError::Task(cause) => pending.abort(cause),
        other => pending.abort(&TaskError::failed(other.to_string())),
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use resumption_core::test_utils::{AbortProbe, ScriptedResolver};
    use resumption_core::{Request, collect};
    use serde_json::json;

    fn req(n: u32) -> Request {
        Request::sequenced("db", json!(n))
    }

    #[tokio::test]
    async fn ready_task_makes_no_round_trip() {
        let resolver = Arc::new(ScriptedResolver::echo());
        let executor = Executor::new(Arc::clone(&resolver));
        let (value, trace) = executor.run_traced(DataTask::ready(3)).await.unwrap();
        assert_eq!(value, 3);
        assert_eq!(trace.round_trips(), 0);
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn trace_counts_requests_and_sources() {
        let resolver = Arc::new(ScriptedResolver::echo());
        let executor = Executor::new(resolver);
        let task = collect(vec![
            DataTask::request(req(1)),
            DataTask::request(req(2)),
            DataTask::request(Request::sequenced("cache", json!(3))),
        ]);
        let (values, trace) = executor.run_traced(task).await.unwrap();
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(trace.round_trips(), 1);
        assert_eq!(trace.rounds[0].requests, 3);
        assert_eq!(trace.rounds[0].sources, 2);
    }

    #[tokio::test]
    async fn round_limit_aborts_blocked_task() {
        let probe = AbortProbe::new();
        let next = probe.clone();
        let task = DataTask::request(req(1)).and_then(move |_| next.request(req(2)));
        let executor = Executor::new(Arc::new(ScriptedResolver::echo()))
            .with_config(ExecConfig::new().with_max_rounds(1));

        let err = executor.run(task).await.unwrap_err();
        assert!(matches!(err, ExecError::RoundLimit(1)));
        assert_eq!(probe.aborted(), 1);
        assert!(probe.causes()[0].contains("max_rounds=1"));
    }
}

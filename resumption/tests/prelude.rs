use async_trait::async_trait;
use resumption::prelude::*;
use serde_json::json;
use std::sync::Arc;

/// Answers every leaf with its payload doubled.
struct Doubler;

#[async_trait]
impl Resolver for Doubler {
    async fn resolve(&self, batch: &Batch) -> Result<Response, ResolveError> {
        let values = batch
            .requests()
            .into_iter()
            .map(|r| json!(r.payload.as_i64().unwrap_or_default() * 2))
            .collect();
        Ok(Response::assemble(batch, values)?)
    }
}

#[tokio::test]
async fn prelude_covers_build_and_run() {
    let executor = Executor::new(Arc::new(Doubler));
    let task = sum(
        (1..=3).map(|n| fetch::<i64>(Request::sequenced("numbers", json!(n)))),
        0,
        |a, b| a + b,
    );

    let (total, trace) = executor.run_traced(task).await.unwrap();

    assert_eq!(total, 12);
    assert_eq!(trace.round_trips(), 1);
}

#[tokio::test]
async fn ready_task_needs_no_resolver_call() {
    let executor = Executor::new(Arc::new(Doubler)).with_config(ExecConfig::new());
    let value = executor.run(DataTask::ready("done")).await.unwrap();
    assert_eq!(value, "done");
}

//! Workspace-level integration tests.
//!
//! The same computation is driven against different resolvers to show the
//! algebra is independent of how leaves get fulfilled, and a small blog
//! model shows how fan-out inside chained steps collapses into one round
//! per dependency level.

use resumption::prelude::*;
use resumption::resumption_source_memory::{get, list};
use resumption_core::test_utils::ScriptedResolver;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    author: String,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

fn blog() -> Arc<MemorySource> {
    Arc::new(MemorySource::with_entries([
        ("post:1", json!({ "title": "Batching", "author": "ada" })),
        ("post:2", json!({ "title": "Resuming", "author": "lin" })),
        ("post:3", json!({ "title": "Aborting", "author": "ada" })),
        ("author:ada", json!({ "name": "Ada" })),
        ("author:lin", json!({ "name": "Lin" })),
    ]))
}

fn local(store: &Arc<MemorySource>) -> Arc<LocalResolver> {
    Arc::new(LocalResolver::new(
        SourceRegistry::new().with("blog", Arc::clone(store) as _),
    ))
}

/// Titles with their author's display name, one entry per post.
fn bylines() -> DataTask<Vec<String>> {
    fetch::<Vec<String>>(list("blog", "post:"))
        .and_then(|keys| collect(keys.iter().map(|key| fetch::<Post>(get("blog", key)))))
        .and_then(|posts| {
            collect(posts.into_iter().map(|post| {
                fetch::<Author>(get("blog", &format!("author:{}", post.author)))
                    .map(move |author| format!("{} by {}", post.title, author.name))
            }))
        })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolver swap
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn same_computation_runs_against_any_resolver() {
    init_tracing();
    let pair = || {
        fetch::<u64>(Request::sequenced("numbers", json!(3)))
            .zip_with(fetch::<u64>(Request::sequenced("numbers", json!(4))), |a, b| a * b)
    };

    let scripted = Executor::new(Arc::new(ScriptedResolver::echo()));
    assert_eq!(scripted.run(pair()).await.unwrap(), 12);

    let numbers = Arc::new(LocalResolver::new(
        SourceRegistry::new().with("numbers", Arc::new(Echo)),
    ));
    assert_eq!(Executor::new(numbers).run(pair()).await.unwrap(), 12);
}

struct Echo;

#[async_trait::async_trait]
impl Source for Echo {
    async fn execute(&self, request: &Request) -> Result<serde_json::Value, SourceError> {
        Ok(request.payload.clone())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Round collapsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn one_round_per_dependency_level() {
    init_tracing();
    let store = blog();
    let executor = Executor::new(local(&store));

    let (lines, trace) = executor.run_traced(bylines()).await.unwrap();

    assert_eq!(
        lines,
        vec!["Batching by Ada", "Resuming by Lin", "Aborting by Ada"]
    );
    assert_eq!(trace.round_trips(), 3);
    let per_round: Vec<usize> = trace.rounds.iter().map(|r| r.requests).collect();
    assert_eq!(per_round, vec![1, 3, 3]);
    assert_eq!(trace.total_requests(), store.operations().len());
}

#[tokio::test]
async fn independent_computations_share_rounds_when_combined() {
    let store = blog();
    let executor = Executor::new(local(&store));

    let (both, trace) = executor
        .run_traced(bylines().zip(bylines()))
        .await
        .unwrap();

    assert_eq!(both.0, both.1);
    assert_eq!(trace.round_trips(), 3);
    assert_eq!(trace.total_requests(), 14);
}

#[tokio::test]
async fn executions_run_concurrently_over_one_resolver() {
    let store = blog();
    let executor = Arc::new(Executor::new(local(&store)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.run(bylines()).await })
        })
        .collect();

    for handle in handles {
        let lines = handle.await.unwrap().unwrap();
        assert_eq!(lines.len(), 3);
    }
    assert_eq!(store.operations().len(), 4 * 7);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Failures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn missing_row_fails_decode_with_sibling_index() {
    let store = Arc::new(MemorySource::with_entries([(
        "post:1",
        json!({ "title": "Only", "author": "ada" }),
    )]));
    let executor = Executor::new(local(&store));

    let task = collect([
        fetch::<Post>(get("blog", "post:1")),
        fetch::<Post>(get("blog", "post:9")),
    ]);
    let err = executor.run(task).await.unwrap_err();

    match err {
        ExecError::Task(err) => {
            let causes = err.causes();
            assert_eq!(causes.len(), 1);
            assert_eq!(causes[0].sibling(), Some(1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unregistered_source_is_a_resolver_failure() {
    let store = blog();
    let executor = Executor::new(local(&store));

    let err = executor
        .run(fetch::<Post>(get("archive", "post:1")))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExecError::Resolve(ResolveError::UnknownSource(_))
    ));
}

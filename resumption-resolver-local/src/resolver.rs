use crate::registry::SourceRegistry;
use crate::source::Source;
use async_trait::async_trait;
use resumption_core::{Batch, GroupId, Request, ResolveError, Resolver, Response, SourceId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// In-process resolver that fans a batch out to registered sources.
///
/// Leaf requests are split into lanes, one per (source, sequencing group)
/// pair, in order of first appearance. Each lane runs on its own tokio task
/// and issues its requests one after another in batch order; lanes run
/// concurrently. Answers are put back in batch position, so the response
/// always has the batch's shape.
///
/// A request against an unregistered source fails the batch before anything
/// is dispatched. A failing request fails the whole batch once every lane
/// has finished; when several lanes fail, the earliest lane's error wins.
/// Dropping the `resolve` future aborts the lanes still in flight.
pub struct LocalResolver {
    registry: SourceRegistry,
}

impl LocalResolver {
    /// Create a resolver over `registry`.
    pub fn new(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    /// The sources this resolver dispatches to.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    fn plan(&self, batch: &Batch) -> Result<Vec<Lane>, ResolveError> {
        let mut lanes: Vec<Lane> = Vec::new();
        let mut by_key: HashMap<(&SourceId, &GroupId), usize> = HashMap::new();

        for (position, request) in batch.requests().into_iter().enumerate() {
            let key = (&request.source, &request.group);
            let index = match by_key.get(&key) {
                Some(&index) => index,
                None => {
                    let source = self
                        .registry
                        .get(&request.source)
                        .ok_or_else(|| ResolveError::UnknownSource(request.source.to_string()))?;
                    lanes.push(Lane {
                        source_id: request.source.clone(),
                        group: request.group.clone(),
                        source: Arc::clone(source),
                        requests: Vec::new(),
                    });
                    by_key.insert(key, lanes.len() - 1);
                    lanes.len() - 1
                }
            };
            lanes[index].requests.push((position, request.clone()));
        }

        Ok(lanes)
    }
}

#[async_trait]
impl Resolver for LocalResolver {
    async fn resolve(&self, batch: &Batch) -> Result<Response, ResolveError> {
        let lanes = self.plan(batch)?;
        let leaves = batch.len();
        tracing::debug!(requests = leaves, lanes = lanes.len(), "resumption.resolve");

        // Dropping the set aborts every lane still in flight.
        let mut running = JoinSet::new();
        for (index, lane) in lanes.into_iter().enumerate() {
            running.spawn(async move { (index, lane.run().await) });
        }

        let mut values = vec![serde_json::Value::Null; leaves];
        let mut failure: Option<(usize, ResolveError)> = None;
        while let Some(joined) = running.join_next().await {
            let (index, error) = match joined {
                Ok((_, Ok(answers))) => {
                    for (position, value) in answers {
                        values[position] = value;
                    }
                    continue;
                }
                Ok((index, Err(error))) => (index, error),
                Err(error) => (usize::MAX, ResolveError::Dispatch(error.to_string())),
            };
            if failure.as_ref().is_none_or(|(first, _)| index < *first) {
                failure = Some((index, error));
            }
        }

        if let Some((_, error)) = failure {
            return Err(error);
        }
        Ok(Response::assemble(batch, values)?)
    }
}

/// Requests bound for one source within one sequencing group, tagged with
/// their leaf position in the batch.
struct Lane {
    source_id: SourceId,
    group: GroupId,
    source: Arc<dyn Source>,
    requests: Vec<(usize, Request)>,
}

impl Lane {
    async fn run(self) -> Result<Vec<(usize, serde_json::Value)>, ResolveError> {
        let Lane {
            source_id,
            group,
            source,
            requests,
        } = self;
        tracing::debug!(
            source = %source_id,
            group = %group,
            requests = requests.len(),
            "resumption.lane.dispatch"
        );

        let mut answers = Vec::with_capacity(requests.len());
        for (position, request) in requests {
            let value = source
                .execute(&request)
                .await
                .map_err(|e| ResolveError::Source {
                    source_id: source_id.to_string(),
                    message: e.to_string(),
                })?;
            answers.push((position, value));
        }
        Ok(answers)
    }
}

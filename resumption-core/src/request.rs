//! Leaf requests and the batches that group them for joint dispatch.

use crate::error::ShapeMismatch;
use crate::id::{GroupId, SourceId};
use crate::response::Response;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};

/// A leaf description of one unit of external work.
///
/// The core never looks inside `payload`. Only the adapter serving
/// `source` knows what it means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The store or session this request must run against.
    pub source: SourceId,
    /// Requests sharing a group are issued to `source` in batch order.
    pub group: GroupId,
    /// Opaque work description.
    pub payload: serde_json::Value,
}

impl Request {
    /// Create a request with an explicit sequencing group.
    pub fn new(
        source: impl Into<SourceId>,
        group: impl Into<GroupId>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            source: source.into(),
            group: group.into(),
            payload,
        }
    }

    /// Create a request whose sequencing group is its source, so every
    /// request built this way against one source is issued in order.
    pub fn sequenced(source: impl Into<SourceId>, payload: serde_json::Value) -> Self {
        let source = source.into();
        Self {
            group: GroupId::from(&source),
            source,
            payload,
        }
    }
}

/// An ordered tree of requests making up one round of outstanding work.
///
/// Position is the only thing correlating a request with its answer: the
/// resolver must return a [`Response`] with the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Batch {
    /// A single request.
    One(Request),
    /// Sibling batches dispatched together.
    Many(Vec<Batch>),
}

impl Batch {
    /// A batch of exactly one request.
    pub fn one(request: Request) -> Self {
        Self::One(request)
    }

    /// A composite of sub-batches, in order.
    pub fn many(children: impl IntoIterator<Item = Batch>) -> Self {
        Self::Many(children.into_iter().collect())
    }

    /// Number of leaf requests.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(children) => children.iter().map(Batch::len).sum(),
        }
    }

    /// True when the batch holds no leaf request.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The outline of this batch.
    pub fn shape(&self) -> Shape {
        match self {
            Self::One(_) => Shape::One,
            Self::Many(children) => Shape::Many(children.iter().map(Batch::shape).collect()),
        }
    }

    /// Leaf requests in depth-first order. This is the order a resolver
    /// hands values to [`Response::assemble`].
    pub fn requests(&self) -> Vec<&Request> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a Request>) {
        match self {
            Self::One(request) => out.push(request),
            Self::Many(children) => {
                for child in children {
                    child.collect_into(out);
                }
            }
        }
    }

    /// True when `response` has exactly this batch's shape.
    pub fn matches(&self, response: &Response) -> bool {
        match (self, response) {
            (Self::One(_), Response::One(_)) => true,
            (Self::Many(batches), Response::Many(responses)) => {
                batches.len() == responses.len()
                    && batches.iter().zip(responses).all(|(b, r)| b.matches(r))
            }
            _ => false,
        }
    }

    /// Validate that `response` answers this batch.
    pub fn check(&self, response: &Response) -> Result<(), ShapeMismatch> {
        if self.matches(response) {
            Ok(())
        } else {
            Err(ShapeMismatch {
                expected: self.shape(),
                found: response.shape(),
            })
        }
    }
}

impl From<Request> for Batch {
    fn from(request: Request) -> Self {
        Self::One(request)
    }
}

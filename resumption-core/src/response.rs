//! Responses returned by a resolver, mirroring the batch they answer.

use crate::error::ShapeMismatch;
use crate::request::Batch;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};

/// The answer to a [`Batch`]: same arity, same order, opaque leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    /// The answer to a single request.
    One(serde_json::Value),
    /// Answers to sibling batches, in order.
    Many(Vec<Response>),
}

impl Response {
    /// A leaf response.
    pub fn one(value: serde_json::Value) -> Self {
        Self::One(value)
    }

    /// A composite of sub-responses, in order.
    pub fn many(children: impl IntoIterator<Item = Response>) -> Self {
        Self::Many(children.into_iter().collect())
    }

    /// The outline of this response.
    pub fn shape(&self) -> Shape {
        match self {
            Self::One(_) => Shape::One,
            Self::Many(children) => Shape::Many(children.iter().map(Response::shape).collect()),
        }
    }

    /// Take the leaf value, failing if this is a composite.
    pub fn into_one(self) -> Result<serde_json::Value, ShapeMismatch> {
        match self {
            Self::One(value) => Ok(value),
            other => Err(ShapeMismatch {
                expected: Shape::One,
                found: other.shape(),
            }),
        }
    }

    /// Split a composite into exactly `arity` children.
    pub fn into_many(self, arity: usize) -> Result<Vec<Response>, ShapeMismatch> {
        match self {
            Self::Many(children) if children.len() == arity => Ok(children),
            other => Err(ShapeMismatch {
                expected: Shape::Many(vec![Shape::One; arity]),
                found: other.shape(),
            }),
        }
    }

    /// Split a two-way composite into its children.
    pub fn into_pair(self) -> Result<(Response, Response), ShapeMismatch> {
        let mismatch = |found| ShapeMismatch {
            expected: Shape::flat(2),
            found,
        };
        match self {
            Self::Many(children) => match <[Response; 2]>::try_from(children) {
                Ok([left, right]) => Ok((left, right)),
                Err(children) => Err(mismatch(Response::Many(children).shape())),
            },
            one => Err(mismatch(one.shape())),
        }
    }

    /// Rebuild a response with `batch`'s shape from leaf values given in
    /// the order of [`Batch::requests`].
    pub fn assemble(batch: &Batch, values: Vec<serde_json::Value>) -> Result<Self, ShapeMismatch> {
        let count = values.len();
        let mut leaves = values.into_iter();
        match build(batch, &mut leaves) {
            Some(response) if leaves.next().is_none() => Ok(response),
            _ => Err(ShapeMismatch {
                expected: batch.shape(),
                found: Shape::flat(count),
            }),
        }
    }
}

fn build<I>(batch: &Batch, leaves: &mut I) -> Option<Response>
where
    I: Iterator<Item = serde_json::Value>,
{
    match batch {
        Batch::One(_) => leaves.next().map(Response::One),
        Batch::Many(children) => {
            let mut out = Vec::with_capacity(children.len());
            for child in children {
                out.push(build(child, leaves)?);
            }
            Some(Response::Many(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use serde_json::json;

    #[test]
    fn assemble_follows_batch_shape() {
        let leaf = |n: u32| Batch::one(Request::sequenced("db", json!(n)));
        let batch = Batch::many([leaf(0), Batch::many([leaf(1), leaf(2)])]);
        let response =
            Response::assemble(&batch, vec![json!("a"), json!("b"), json!("c")]).unwrap();
        assert_eq!(
            response,
            Response::many([
                Response::one(json!("a")),
                Response::many([Response::one(json!("b")), Response::one(json!("c"))]),
            ])
        );
        assert!(batch.matches(&response));
    }

    #[test]
    fn assemble_rejects_wrong_count() {
        let batch = Batch::one(Request::sequenced("db", json!(0)));
        let err = Response::assemble(&batch, vec![json!(1), json!(2)]).unwrap_err();
        assert_eq!(err.expected, Shape::One);
        assert_eq!(err.found, Shape::flat(2));
    }

    #[test]
    fn into_many_checks_arity() {
        let response = Response::many([Response::one(json!(1))]);
        assert!(response.clone().into_many(2).is_err());
        assert_eq!(response.into_many(1).unwrap().len(), 1);
        assert!(Response::many([]).into_one().is_err());
    }
}

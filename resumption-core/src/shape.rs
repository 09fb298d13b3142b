//! Structural outline shared by batches and responses.

use crate::error::ShapeMismatch;
use crate::response::Response;
use std::fmt;

/// The tree outline of a [`Batch`](crate::Batch) or [`Response`](crate::Response),
/// with leaf contents erased.
///
/// Two values correlate only when their shapes are equal. Displayed as `1`
/// for a leaf and `[a, b, ...]` for a composite.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single leaf.
    One,
    /// An ordered composite.
    Many(Vec<Shape>),
}

impl Shape {
    /// A composite of `n` leaves.
    pub fn flat(n: usize) -> Self {
        Self::Many(vec![Self::One; n])
    }

    /// Number of leaves under this shape.
    pub fn leaves(&self) -> usize {
        match self {
            Self::One => 1,
            Self::Many(children) => children.iter().map(Shape::leaves).sum(),
        }
    }

    /// Validate that `response` has exactly this shape.
    pub fn check(&self, response: &Response) -> Result<(), ShapeMismatch> {
        let found = response.shape();
        if *self == found {
            Ok(())
        } else {
            Err(ShapeMismatch {
                expected: self.clone(),
                found,
            })
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("1"),
            Self::Many(children) => {
                f.write_str("[")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested() {
        let shape = Shape::Many(vec![Shape::One, Shape::flat(2), Shape::Many(vec![])]);
        assert_eq!(shape.to_string(), "[1, [1, 1], []]");
        assert_eq!(shape.leaves(), 3);
    }

    #[test]
    fn check_compares_nesting_not_leaf_count() {
        let shape = Shape::Many(vec![Shape::flat(2), Shape::One]);
        let flat = Response::many([
            Response::one(serde_json::Value::Null),
            Response::one(serde_json::Value::Null),
            Response::one(serde_json::Value::Null),
        ]);
        let err = shape.check(&flat).unwrap_err();
        assert_eq!(err.expected, shape);
        assert_eq!(err.found, Shape::flat(3));
    }
}

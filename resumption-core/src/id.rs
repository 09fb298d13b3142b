//! Typed identifiers for data sources and sequencing groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source and group identities are opaque strings. The core compares them
/// for equality and nothing else; what a source id maps to is decided by
/// whoever resolves the batch.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(
    SourceId,
    "Identifies the physical store or session a request must run against."
);
typed_id!(
    GroupId,
    "Identifies a sequencing group. Requests sharing a group are issued to their source in batch order."
);

impl From<&SourceId> for GroupId {
    fn from(source: &SourceId) -> Self {
        Self(source.0.clone())
    }
}

#![deny(missing_docs)]
//! # resumption — umbrella crate
//!
//! Single import surface for batched, resumable data computations.
//! Re-exports the protocol crate and the implementations behind feature
//! flags, plus a `prelude` for the happy path.

#[cfg(feature = "core")]
pub use resumption_core;
#[cfg(feature = "exec")]
pub use resumption_exec;
#[cfg(feature = "resolver-local")]
pub use resumption_resolver_local;
#[cfg(feature = "source-memory")]
pub use resumption_source_memory;

/// Happy-path imports for building and running computations.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use resumption_core::{
        Batch, DataTask, GroupId, Request, ResolveError, Resolver, Response, SourceId, Step,
        TaskError, collect, fetch, sum,
    };

    #[cfg(feature = "exec")]
    pub use resumption_exec::{ExecConfig, ExecError, ExecTrace, Executor};

    #[cfg(feature = "resolver-local")]
    pub use resumption_resolver_local::{LocalResolver, Source, SourceError, SourceRegistry};

    #[cfg(feature = "source-memory")]
    pub use resumption_source_memory::MemorySource;
}

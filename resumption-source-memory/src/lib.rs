#![deny(missing_docs)]
//! In-memory key/value [`Source`] for resumption resolvers.
//!
//! Uses a `BTreeMap` behind a `RwLock` so `list` comes back sorted.
//! Request payloads are JSON commands tagged by `op`:
//!
//! | Payload | Answer |
//! |---------|--------|
//! | `{"op":"get","key":K}` | stored value or `null` |
//! | `{"op":"put","key":K,"value":V}` | previous value or `null` |
//! | `{"op":"delete","key":K}` | removed value or `null` |
//! | `{"op":"list","prefix":P}` | sorted array of matching keys |
//!
//! Every executed command is appended to an operation log, which tests use
//! to check the order a resolver issued requests in.

use async_trait::async_trait;
use resumption_core::{Request, SourceId};
use resumption_resolver_local::{Source, SourceError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;

/// A decoded request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Read one key.
    Get {
        /// Key to read.
        key: String,
    },
    /// Store a value, answering with what it replaced.
    Put {
        /// Key to write.
        key: String,
        /// Value to store.
        value: Value,
    },
    /// Remove a key, answering with what was removed.
    Delete {
        /// Key to remove.
        key: String,
    },
    /// List keys starting with `prefix`, in key order.
    List {
        /// Key prefix; empty lists everything.
        #[serde(default)]
        prefix: String,
    },
}

/// Request for the value under `key`.
pub fn get(source: impl Into<SourceId>, key: &str) -> Request {
    Request::sequenced(source, json!({ "op": "get", "key": key }))
}

/// Request to store `value` under `key`.
pub fn put(source: impl Into<SourceId>, key: &str, value: Value) -> Request {
    Request::sequenced(source, json!({ "op": "put", "key": key, "value": value }))
}

/// Request to remove `key`.
pub fn delete(source: impl Into<SourceId>, key: &str) -> Request {
    Request::sequenced(source, json!({ "op": "delete", "key": key }))
}

/// Request for the keys starting with `prefix`.
pub fn list(source: impl Into<SourceId>, prefix: &str) -> Request {
    Request::sequenced(source, json!({ "op": "list", "prefix": prefix }))
}

/// In-memory key/value source.
///
/// Suitable for tests and single-process use; nothing survives a restart.
pub struct MemorySource {
    data: RwLock<BTreeMap<String, Value>>,
    log: Mutex<Vec<Command>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Create a source pre-populated with `entries`. Seeding is not logged.
    pub fn with_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let data = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            data: RwLock::new(data),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Commands executed so far, in execution order.
    pub fn operations(&self) -> Vec<Command> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current value under `key`, bypassing the request path.
    pub async fn peek(&self, key: &str) -> Option<Value> {
        self.data.read().await.get(key).cloned()
    }

    async fn apply(&self, command: &Command) -> Value {
        match command {
            Command::Get { key } => {
                let data = self.data.read().await;
                data.get(key).cloned().unwrap_or(Value::Null)
            }
            Command::Put { key, value } => {
                let mut data = self.data.write().await;
                data.insert(key.clone(), value.clone())
                    .unwrap_or(Value::Null)
            }
            Command::Delete { key } => {
                let mut data = self.data.write().await;
                data.remove(key).unwrap_or(Value::Null)
            }
            Command::List { prefix } => {
                let data = self.data.read().await;
                let keys: Vec<Value> = data
                    .keys()
                    .filter(|k| k.starts_with(prefix.as_str()))
                    .map(|k| Value::String(k.clone()))
                    .collect();
                Value::Array(keys)
            }
        }
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn execute(&self, request: &Request) -> Result<Value, SourceError> {
        let command: Command = serde_json::from_value(request.payload.clone())
            .map_err(|e| SourceError::InvalidPayload(e.to_string()))?;
        let answer = self.apply(&command).await;
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
        Ok(answer)
    }
}

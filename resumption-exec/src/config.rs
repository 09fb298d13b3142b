//! Driver configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How an [`Executor`](crate::Executor) bounds a run.
///
/// Deserializes from partial JSON; missing fields take their defaults.
///
/// ```
/// use resumption_exec::ExecConfig;
///
/// let config: ExecConfig = serde_json::from_str(r#"{ "round_timeout_ms": 250 }"#).unwrap();
/// assert_eq!(config.max_rounds, 1024);
/// assert_eq!(config.round_timeout().unwrap().as_millis(), 250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Maximum number of resolver round trips before the run is abandoned.
    /// Zero disables the bound.
    pub max_rounds: usize,
    /// Deadline for a single resolver call, in milliseconds. A call that
    /// overruns it is treated as a resolver failure.
    pub round_timeout_ms: Option<u64>,
}

impl ExecConfig {
    /// Default configuration: 1024 rounds, no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the round bound. Zero disables it.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the per-round resolver deadline.
    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The per-round resolver deadline, if any.
    pub fn round_timeout(&self) -> Option<Duration> {
        self.round_timeout_ms.map(Duration::from_millis)
    }

    /// True when `round` is past the configured bound.
    pub(crate) fn exceeds(&self, round: usize) -> bool {
        self.max_rounds > 0 && round > self.max_rounds
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            max_rounds: 1024,
            round_timeout_ms: None,
        }
    }
}

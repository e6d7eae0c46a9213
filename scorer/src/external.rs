// scorer/src/external.rs
//
// Boundary for collaborators outside the scoring core.
//
// Anything that talks to the outside world (report sinks today; threat-intel
// or synthesis APIs if they are ever wired in) implements `ExternalService`
// and is driven through `call_with_retry`, which applies capped exponential
// backoff and surfaces `ScorerError::ExternalExhausted` once the budget is
// spent.  The simulator and analyzers never touch this module.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{Result, ScorerError};

// ── Policy ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = max_retries + 1.
    pub max_retries:      u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms:     u64,
    pub multiplier:       f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries:      3,
            initial_delay_ms: 100,
            max_delay_ms:     30_000,
            multiplier:       2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based), capped at `max_delay_ms`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.multiplier.max(1.0).powi(retry as i32);
        Duration::from_millis(base.min(self.max_delay_ms as f64) as u64)
    }
}

// ── Service trait ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceFailure {
    pub message:   String,
    /// false = retrying cannot help (bad credentials, permission denied, ...).
    pub retryable: bool,
}

impl ServiceFailure {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: true }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: false }
    }
}

pub trait ExternalService {
    type Request;
    type Response;

    fn name(&self) -> &str;

    fn call(&self, request: &Self::Request)
        -> impl Future<Output = std::result::Result<Self::Response, ServiceFailure>> + Send;
}

pub async fn call_with_retry<S: ExternalService>(
    service: &S,
    request: &S::Request,
    policy:  &RetryPolicy,
) -> Result<S::Response> {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match service.call(request).await {
            Ok(resp) => return Ok(resp),
            Err(e) if e.retryable && attempts <= policy.max_retries => {
                let delay = policy.delay_for(attempts - 1);
                debug!(
                    service  = service.name(),
                    attempt  = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error    = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!("{} failed after {} attempts: {}", service.name(), attempts, e);
                return Err(ScorerError::ExternalExhausted { attempts, last: e.message });
            }
        }
    }
}

// ── File sink ─────────────────────────────────────────────────────────────────

/// Writes a report payload to a fixed path, creating parent directories.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ExternalService for FileSink {
    type Request  = String;
    type Response = usize;

    fn name(&self) -> &str {
        "file-sink"
    }

    async fn call(&self, payload: &String) -> std::result::Result<usize, ServiceFailure> {
        let classify = |e: std::io::Error| {
            let msg = format!("{}: {}", self.path.display(), e);
            match e.kind() {
                std::io::ErrorKind::PermissionDenied => ServiceFailure::permanent(msg),
                _ => ServiceFailure::transient(msg),
            }
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(classify)?;
        }
        tokio::fs::write(&self.path, payload.as_bytes()).await.map_err(classify)?;
        Ok(payload.len())
    }
}

//! Tunables of the synchronizer.
use serde::Deserialize;
use std::time::Duration;

/// What the synchronizer does with an update notification for a note it doesn't hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Ignore the notification.
    #[default]
    DropIfMissing,
    /// Append the note to the collection.
    InsertIfMissing,
}

/// How a successful local delete reaches the note collection.
///
/// The deletion listener is registered under both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Remove the note as soon as the service acknowledges the delete.
    #[default]
    FilterLocally,
    /// Leave the collection alone until the deletion notification arrives.
    AwaitNotification,
}

/// Exponential backoff for the initial load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first failure.
    pub fn no_retry() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before attempt number `attempt + 1`, where `attempt` starts at 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    pub update_policy: UpdatePolicy,
    pub delete_policy: DeletePolicy,
    pub load_retry: RetryPolicy,
}

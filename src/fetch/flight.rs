//! Singleflight registry
//!
//! Maps a key to the completion signal of the one operation currently running
//! for it. The first caller for a key registers the signal and spawns the work;
//! everyone arriving while it runs subscribes to the same signal and receives
//! the same outcome. The marker is removed once the work finishes, so a failed
//! outcome is never served to later callers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::document::{DocumentError, Result};

type Outcome<T> = Option<Result<T>>;

/// Deduplicates concurrent operations per key
pub struct SingleFlight<T> {
    calls: Arc<Mutex<HashMap<String, watch::Receiver<Outcome<T>>>>>,
}

impl<T> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
        }
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key` unless an operation for `key` is already running,
    /// in which case wait for that one instead
    ///
    /// `work` runs on its own task: a caller that stops waiting does not cancel
    /// the operation for the others.
    pub async fn run<F>(&self, key: &str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let mut rx = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(rx) => {
                    tracing::debug!(key = %key, "Joining in-flight operation");
                    rx.clone()
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    calls.insert(key.to_string(), rx.clone());

                    let guard = FlightGuard {
                        calls: self.calls.clone(),
                        key: key.to_string(),
                    };
                    tokio::spawn(async move {
                        let outcome = work.await;
                        // The marker is gone before any waiter wakes
                        drop(guard);
                        tx.send_replace(Some(outcome));
                    });
                    rx
                }
            }
        };

        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map(|outcome| (*outcome).clone())
            .map_err(|_| DocumentError::Internal(format!("operation for {} was abandoned", key)))?;

        outcome.unwrap_or_else(|| {
            Err(DocumentError::Internal(format!(
                "operation for {} finished without an outcome",
                key
            )))
        })
    }

    /// Number of operations currently running
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Removes the registry marker when the work task ends, including by panic
struct FlightGuard<T> {
    calls: Arc<Mutex<HashMap<String, watch::Receiver<Outcome<T>>>>>,
    key: String,
}

impl<T> Drop for FlightGuard<T> {
    fn drop(&mut self) {
        self.calls.lock().remove(&self.key);
    }
}

//! Admission control in front of the connection pool
//!
//! sqlx's pool only knows "wait up to a timeout". The store options we accept
//! also say whether to wait at all and how many callers may queue, so every
//! statement first takes a permit here.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::StoreError;

/// Queueing behaviour when all connections are busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// Maximum statements holding a connection at once.
    pub connection_limit: usize,
    /// Queue the caller instead of failing immediately.
    pub wait_for_connections: bool,
    /// Maximum queued callers; 0 means unbounded.
    pub queue_limit: usize,
    /// Longest a queued caller waits before giving up.
    pub acquire_timeout: Duration,
}

/// Bounded admission with an optional bounded wait queue.
#[derive(Debug)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    waiting: AtomicUsize,
    policy: AdmissionPolicy,
}

/// Held for the duration of one statement.
#[derive(Debug)]
pub struct Admission {
    _permit: OwnedSemaphorePermit,
}

/// Decrements the waiter count however the wait ends.
struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(policy.connection_limit)),
            waiting: AtomicUsize::new(0),
            policy,
        }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Callers currently queued for a permit.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Permits not held by any statement.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn admit(&self) -> Result<Admission, StoreError> {
        if let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() {
            return Ok(Admission { _permit: permit });
        }

        if !self.policy.wait_for_connections {
            return Err(StoreError::unavailable(
                "no connection available and waiting for connections is disabled",
            ));
        }

        let queued = self.waiting.fetch_add(1, Ordering::SeqCst);
        let _guard = WaitingGuard(&self.waiting);
        if self.policy.queue_limit > 0 && queued >= self.policy.queue_limit {
            return Err(StoreError::unavailable(format!(
                "connection queue limit reached ({})",
                self.policy.queue_limit
            )));
        }

        tracing::debug!(queued = queued + 1, "waiting for a pooled connection");
        let acquire = Arc::clone(&self.permits).acquire_owned();
        match tokio::time::timeout(self.policy.acquire_timeout, acquire).await {
            Ok(Ok(permit)) => Ok(Admission { _permit: permit }),
            Ok(Err(_)) => Err(StoreError::unavailable("connection pool is closed")),
            Err(_) => Err(StoreError::unavailable(format!(
                "timed out after {:?} waiting for a connection",
                self.policy.acquire_timeout
            ))),
        }
    }

    /// Refuse all current and future waiters.
    pub fn close(&self) {
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(limit: usize, wait: bool, queue: usize) -> AdmissionPolicy {
        AdmissionPolicy {
            connection_limit: limit,
            wait_for_connections: wait,
            queue_limit: queue,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn admits_up_to_connection_limit() {
        let gate = AdmissionGate::new(policy(2, false, 0));
        let _a = gate.admit().await.unwrap();
        let _b = gate.admit().await.unwrap();
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn fails_fast_when_not_waiting() {
        let gate = AdmissionGate::new(policy(1, false, 0));
        let _held = gate.admit().await.unwrap();
        let err = gate.admit().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn released_permit_is_reused() {
        let gate = AdmissionGate::new(policy(1, false, 0));
        drop(gate.admit().await.unwrap());
        assert!(gate.admit().await.is_ok());
    }

    #[tokio::test]
    async fn queued_caller_proceeds_after_release() {
        let gate = Arc::new(AdmissionGate::new(policy(1, true, 0)));
        let held = gate.admit().await.unwrap();

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.admit().await.map(|_| ()) })
        };
        while gate.waiting() == 0 {
            tokio::task::yield_now().await;
        }
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
        assert_eq!(gate.waiting(), 0);
    }

    #[tokio::test]
    async fn queue_limit_rejects_extra_waiters() {
        let gate = Arc::new(AdmissionGate::new(policy(1, true, 1)));
        let held = gate.admit().await.unwrap();

        let first = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.admit().await.map(|_| ()) })
        };
        while gate.waiting() == 0 {
            tokio::task::yield_now().await;
        }

        let err = gate.admit().await.unwrap_err();
        assert!(err.message().contains("queue limit"));
        assert_eq!(gate.waiting(), 1);

        drop(held);
        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn queued_wait_times_out() {
        let gate = AdmissionGate::new(AdmissionPolicy {
            acquire_timeout: Duration::from_millis(50),
            ..policy(1, true, 0)
        });
        let _held = gate.admit().await.unwrap();

        let err = gate.admit().await.unwrap_err();
        assert!(err.message().contains("timed out"));
        assert_eq!(gate.waiting(), 0);
    }

    #[tokio::test]
    async fn closed_gate_refuses_waiters() {
        let gate = AdmissionGate::new(policy(1, true, 0));
        let _held = gate.admit().await.unwrap();
        gate.close();
        let err = gate.admit().await.unwrap_err();
        assert!(err.message().contains("closed"));
    }
}

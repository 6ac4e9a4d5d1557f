//! Bounded wait for local replication to catch up
//!
//! The position record has no change notification, so this is a constant
//! interval poll against a deadline. The pause primitive is a trait so a
//! push-based source can replace it without touching the loop.

use crate::config::PollConfig;
use crate::position::{PositionSource, TxNumber};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Suspends the current task between position reads
#[async_trait]
pub trait Pause: Send + Sync {
    /// Yield for roughly `duration` without blocking the runtime
    async fn pause(&self, duration: Duration);
}

/// `tokio::time::sleep` backed pause
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polls a position source until it reaches a target or time runs out
#[derive(Debug, Clone)]
pub struct ReplicationWaiter<S, P = TokioPause> {
    source: S,
    pause: P,
}

impl<S: PositionSource> ReplicationWaiter<S> {
    /// Create a waiter that sleeps on the tokio timer
    pub fn new(source: S) -> Self {
        Self::with_pause(source, TokioPause)
    }
}

impl<S: PositionSource, P: Pause> ReplicationWaiter<S, P> {
    /// Create a waiter with a custom pause primitive
    pub fn with_pause(source: S, pause: P) -> Self {
        Self { source, pause }
    }

    /// Underlying position source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Wait until the local position is at least `target`
    ///
    /// Returns `true` without pausing when already caught up. Returns `false`
    /// only once the deadline has passed with the position still behind; the
    /// last read is checked after the loop, so reaching the target exactly at
    /// the deadline still counts.
    pub async fn wait_for(&self, target: TxNumber, poll: &PollConfig) -> bool {
        let start = Instant::now();
        let mut current = self.source.tx_number().await;
        if current >= target {
            return true;
        }

        let deadline = start + poll.timeout();
        loop {
            self.pause.pause(poll.interval()).await;
            current = self.source.tx_number().await;
            if current >= target || Instant::now() >= deadline {
                break;
            }
        }

        let caught_up = current >= target;
        if caught_up {
            tracing::debug!(
                %target,
                %current,
                waited_ms = start.elapsed().as_millis() as u64,
                "replication caught up"
            );
        } else {
            tracing::debug!(
                %target,
                %current,
                timeout_ms = poll.timeout_ms,
                "replication wait timed out"
            );
        }
        caught_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// In-memory position that counts reads
    #[derive(Clone, Default)]
    struct Counter {
        position: Arc<AtomicU64>,
        reads: Arc<AtomicUsize>,
    }

    impl Counter {
        fn at(n: u64) -> Self {
            let c = Self::default();
            c.position.store(n, Ordering::SeqCst);
            c
        }
    }

    #[async_trait]
    impl PositionSource for Counter {
        async fn tx_number(&self) -> TxNumber {
            self.reads.fetch_add(1, Ordering::SeqCst);
            TxNumber(self.position.load(Ordering::SeqCst))
        }
    }

    /// Advances the position by one on every pause
    struct Stepper(Counter);

    #[async_trait]
    impl Pause for Stepper {
        async fn pause(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
            self.0.position.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_caught_up_returns_immediately() {
        let source = Counter::at(5);
        let waiter = ReplicationWaiter::new(source.clone());
        let start = Instant::now();

        assert!(waiter.wait_for(TxNumber(5), &PollConfig::default()).await);
        assert!(start.elapsed() < Duration::from_millis(1));
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_polling_once_target_reached() {
        let source = Counter::at(2);
        let waiter = ReplicationWaiter::with_pause(source.clone(), Stepper(source.clone()));
        let start = Instant::now();

        assert!(waiter.wait_for(TxNumber(4), &PollConfig::new(30, 500)).await);
        // initial read + two polls
        assert_eq!(source.reads.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(60) && elapsed < Duration::from_millis(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bound() {
        let source = Counter::at(2);
        let waiter = ReplicationWaiter::new(source.clone());
        let poll = PollConfig::new(30, 500);
        let start = Instant::now();

        assert!(!waiter.wait_for(TxNumber(3), &poll).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= poll.timeout(), "returned early: {elapsed:?}");
        assert!(
            elapsed <= poll.timeout() + poll.interval(),
            "returned late: {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_catching_up_exactly_at_deadline_succeeds() {
        let source = Counter::at(0);
        let waiter = ReplicationWaiter::with_pause(source.clone(), Stepper(source.clone()));

        // Ten 10ms steps land the position on the target at the 100ms deadline.
        assert!(waiter.wait_for(TxNumber(10), &PollConfig::new(10, 100)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_still_checks_once_more() {
        let source = Counter::at(0);
        let waiter = ReplicationWaiter::with_pause(source.clone(), Stepper(source.clone()));

        assert!(waiter.wait_for(TxNumber(1), &PollConfig::new(10, 0)).await);
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waits_time_out_independently() {
        let source = Counter::at(0);
        let waiter = Arc::new(ReplicationWaiter::new(source.clone()));

        let short = {
            let waiter = waiter.clone();
            tokio::spawn(async move {
                let start = Instant::now();
                let ok = waiter.wait_for(TxNumber(1), &PollConfig::new(10, 50)).await;
                (ok, start.elapsed())
            })
        };
        let long = {
            let waiter = waiter.clone();
            tokio::spawn(async move {
                let start = Instant::now();
                let ok = waiter.wait_for(TxNumber(1), &PollConfig::new(10, 200)).await;
                (ok, start.elapsed())
            })
        };

        let (short_ok, short_elapsed) = short.await.unwrap();
        assert!(!short_ok);
        assert!(short_elapsed < Duration::from_millis(100));

        source.position.store(1, Ordering::SeqCst);
        let (long_ok, long_elapsed) = long.await.unwrap();
        assert!(long_ok);
        assert!(long_elapsed < Duration::from_millis(200));
    }
}

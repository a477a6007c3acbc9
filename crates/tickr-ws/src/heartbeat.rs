//! Idle detection for the stream connection.
//!
//! The exchange pushes ticker frames continuously, so a connection that has
//! been silent for longer than the idle timeout is treated as dead even if
//! the TCP socket never reported an error.

use parking_lot::RwLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Tracks the time of the last inbound frame.
///
/// Uses the tokio clock so paused-time tests drive it deterministically.
pub struct IdleMonitor {
    idle_timeout: Duration,
    last_frame: RwLock<Instant>,
}

impl IdleMonitor {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            last_frame: RwLock::new(Instant::now()),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Reset on (re)connect.
    pub fn reset(&self) {
        *self.last_frame.write() = Instant::now();
    }

    /// Record that any frame (data, ping, pong) arrived.
    pub fn record_frame(&self) {
        *self.last_frame.write() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_frame.read().elapsed()
    }

    pub fn is_idle(&self) -> bool {
        self.idle_for() >= self.idle_timeout
    }

    /// Sleep until the connection would become idle if nothing arrives.
    pub async fn wait_for_check(&self) {
        let deadline = *self.last_frame.read() + self.idle_timeout;
        tokio::time::sleep_until(deadline).await;
        debug!(idle_ms = self.idle_for().as_millis() as u64, "Idle check");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_idle_after_timeout() {
        let monitor = IdleMonitor::new(Duration::from_secs(60));
        assert!(!monitor.is_idle());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!monitor.is_idle());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(monitor.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_resets_deadline() {
        let monitor = IdleMonitor::new(Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        monitor.record_frame();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(!monitor.is_idle());

        monitor.wait_for_check().await;
        assert!(monitor.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_check_pending_until_deadline() {
        let monitor = IdleMonitor::new(Duration::from_secs(5));
        let mut check = tokio_test::task::spawn(monitor.wait_for_check());
        tokio_test::assert_pending!(check.poll());

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio_test::assert_ready!(check.poll());
    }
}

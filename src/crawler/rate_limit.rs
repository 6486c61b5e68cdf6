//! Global request pacing.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Stand-in for an interval too long to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Spaces request dispatches at least `interval` apart across all workers.
///
/// Every caller reserves the next free slot under the lock and then sleeps
/// until it without holding it, so waiting workers queue up in slot order.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Negative and non-finite values disable pacing. Values too large for a
    /// `Duration` saturate.
    pub fn from_secs(secs: f64) -> Self {
        let interval = if secs.is_finite() && secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self::new(interval)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for a dispatch slot. Returns `false` if the run was cancelled first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if self.interval.is_zero() {
            return true;
        }

        let slot = self.reserve();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep_until(slot) => true,
        }
    }

    fn reserve(&self) -> Instant {
        let mut next_slot = self.next_slot.lock();
        let now = Instant::now();
        let slot = match *next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        let next = slot
            .checked_add(self.interval)
            .or_else(|| slot.checked_add(FAR_FUTURE))
            .unwrap_or(slot);
        *next_slot = Some(next);
        slot
    }
}

use std::time::Duration;

/// Opaque value handed back to the owning scene when its timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    due: Duration,
    token: TimerToken,
}

/// One-shot timers driven by simulated time, not wall-clock time.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    now: Duration,
    next_handle: u64,
    pending: Vec<PendingTimer>,
}

impl TimerScheduler {
    pub fn schedule(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.pending.push(PendingTimer {
            handle,
            due: self.now.saturating_add(delay),
            token,
        });
        handle
    }

    pub fn schedule_ms(&mut self, delay_ms: u64, token: TimerToken) -> TimerHandle {
        self.schedule(Duration::from_millis(delay_ms), token)
    }

    /// Returns `false` when the timer already fired or was never scheduled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|timer| timer.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward and drains every due timer, ordered by due
    /// time and then by scheduling order. Timers scheduled while handling
    /// the returned tokens are due no earlier than the next advance.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerToken> {
        self.now = self.now.saturating_add(dt);
        let now = self.now;
        let mut due = Vec::new();
        self.pending.retain(|timer| {
            if timer.due <= now {
                due.push(*timer);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|timer| (timer.due, timer.handle));
        due.into_iter().map(|timer| timer.token).collect()
    }

    pub(crate) fn reset(&mut self) {
        self.pending.clear();
        self.now = Duration::ZERO;
    }
}

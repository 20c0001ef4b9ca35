use std::time::{Duration, Instant};

/// Repeating progress timer driven by the worker loop.
///
/// Time is passed in rather than read, so the session can be stepped
/// deterministically.
#[derive(Debug, Clone)]
pub struct ProgressTimer {
    interval: Duration,
    next: Option<Instant>,
    suspended: bool,
}

impl ProgressTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next: None,
            suspended: false,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    /// Hold back ticks without forgetting whether the timer is armed.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self, now: Instant) {
        self.suspended = false;
        if self.next.is_some() {
            self.arm(now);
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// `true` when a tick is due at `now`; the next one is scheduled from `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next {
            Some(due) if !self.suspended && due <= now => {
                self.arm(now);
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.suspended { None } else { self.next }
    }
}

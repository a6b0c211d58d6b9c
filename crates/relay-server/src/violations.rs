/// Sliding-window protocol-violation counter.
///
/// Mirrors the timestamp-list pattern `relay_core::typing::TypingTracker`
/// uses for expiry: record each violation's instant, drop anything older
/// than the window, and compare the remainder against the limit
/// (`spec.md` §7 — "repeated offenses (>=N within window) close the channel").
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub struct ViolationTracker {
    timestamps: VecDeque<Instant>,
    limit: u32,
    window: Duration,
}

impl ViolationTracker {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { timestamps: VecDeque::new(), limit, window }
    }

    /// Record a violation. Returns `true` if the session has now exceeded
    /// the limit within the window and should be disconnected.
    pub fn record(&mut self) -> bool {
        let now = Instant::now();
        self.timestamps.push_back(now);
        while let Some(&front) = self.timestamps.front() {
            if now.duration_since(front) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        self.timestamps.len() as u32 >= self.limit
    }
}

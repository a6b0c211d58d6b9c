/// Group-code generation and the legacy couple-matching waiting pool.
///
/// Split out of `store.rs` the way `group/election.rs` is split out of
/// `group/manager.rs` in the teacher crate — a narrow piece of decision logic
/// the store delegates to.
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::types::{
    GroupCode, SessionId, CODE_ALPHABET, CODE_COLLISION_RETRIES, DEFAULT_CODE_LENGTH,
    WIDENED_CODE_LENGTH,
};

/// Draw a random alphanumeric code of `len` characters.
fn random_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a group code guaranteed not to collide with `is_taken`.
///
/// Retries up to `CODE_COLLISION_RETRIES` times at `DEFAULT_CODE_LENGTH`; if
/// still colliding, widens to `WIDENED_CODE_LENGTH` (`spec.md` §4.4).
pub fn generate_group_code(is_taken: impl Fn(&str) -> bool) -> GroupCode {
    for _ in 0..CODE_COLLISION_RETRIES {
        let candidate = random_code(DEFAULT_CODE_LENGTH);
        if !is_taken(&candidate) {
            return GroupCode::new(candidate);
        }
    }
    loop {
        let candidate = random_code(WIDENED_CODE_LENGTH);
        if !is_taken(&candidate) {
            return GroupCode::new(candidate);
        }
    }
}

/// FIFO of sessions awaiting a partner under the legacy couple-matching
/// flow. Empty in a group-only deployment (`spec.md` §3).
#[derive(Default)]
pub struct WaitingPool {
    queue: VecDeque<(SessionId, Instant)>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self { queue: VecDeque::new() }
    }

    /// Enqueue a waiter, or immediately pair it with the head of the queue.
    /// Returns the matched peer, if any.
    pub fn enqueue_or_match(&mut self, session: SessionId) -> Option<SessionId> {
        if let Some((peer, _)) = self.queue.pop_front() {
            Some(peer)
        } else {
            self.queue.push_back((session, Instant::now()));
            None
        }
    }

    pub fn remove(&mut self, session: SessionId) {
        self.queue.retain(|(s, _)| *s != session);
    }

    /// Sessions that have waited past `timeout` (`spec.md` §4.3 — default 60s).
    pub fn timed_out(&mut self, timeout: Duration) -> Vec<SessionId> {
        let mut expired = Vec::new();
        self.queue.retain(|(session, enqueued_at)| {
            if enqueued_at.elapsed() >= timeout {
                expired.push(*session);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

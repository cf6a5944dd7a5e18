//! Trailing debounce for edit-triggered recompiles.
//!
//! Pure timing: holds at most one pending deadline and the request token
//! issued when it was scheduled. A new schedule replaces the old one.

use std::time::Duration;

use tokio::time::Instant;

use crate::core::RequestToken;

/// Sleep target when nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

#[derive(Debug, Clone, Copy)]
struct Pending {
    deadline: Instant,
    token: RequestToken,
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// (Re)start the quiet period at `now`.
    pub fn schedule(&mut self, token: RequestToken, now: Instant) {
        self.pending = Some(Pending {
            deadline: now + self.window,
            token,
        });
    }

    /// Drop the pending schedule, returning its token.
    pub fn cancel(&mut self) -> Option<RequestToken> {
        self.pending.take().map(|p| p.token)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending schedule fires, or far in the future when idle.
    pub fn deadline(&self) -> Instant {
        match self.pending {
            Some(p) => p.deadline,
            None => Instant::now() + IDLE,
        }
    }

    /// Take the token if the quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<RequestToken> {
        match self.pending {
            Some(p) if now >= p.deadline => self.cancel(),
            _ => None,
        }
    }
}

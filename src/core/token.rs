//! Request tokens for latest-wins ordering.
//!
//! Every scheduled compilation or remote job gets a token from the
//! session's counter at scheduling time. A result is only installed if its
//! token is still the latest one issued.

use std::fmt;

/// Monotonically increasing request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues request tokens and answers "is this still the latest?".
#[derive(Debug, Default)]
pub struct TokenCounter {
    latest: u64,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, superseding every token issued before it.
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    /// Latest issued token (None before the first request).
    pub fn latest(&self) -> Option<RequestToken> {
        (self.latest > 0).then_some(RequestToken(self.latest))
    }

    #[inline]
    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}

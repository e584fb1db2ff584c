//! Per-connection fixed-window rate limiting.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(10),
        }
    }
}

/// Fixed-window counter: requests beyond the budget are rejected until the
/// window rolls over.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            window_start: Instant::now(),
            count: 0,
        }
    }

    /// Record one request; returns false when the budget is exhausted
    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.window_start) >= self.config.window {
            self.window_start = now;
            self.count = 0;
        }

        self.count += 1;
        self.count <= self.config.max_requests
    }
}

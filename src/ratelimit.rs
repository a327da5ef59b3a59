use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use log::debug;
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, time::Duration};

// Code sources are small wiki pages; stay polite.
const REQ_PER_SEC: NonZeroU32 = nonzero!(4u32);
const MAX_BURST: NonZeroU32 = nonzero!(1u32);

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

/// Process-wide pacing of outgoing requests, shared by every parser through
/// the request client.
pub struct RateLimiter {
    req_per_sec: SpecificGovernorRateLimiter,
}

impl RateLimiter {
    pub fn new() -> Self {
        // Limit to X req/sec, no two requests closer than 1/X sec.
        let req_per_sec =
            GovernorRateLimiter::direct(Quota::per_second(REQ_PER_SEC).allow_burst(MAX_BURST));

        RateLimiter { req_per_sec }
    }

    pub async fn wait_until_ready(&self) {
        self.req_per_sec.until_ready().await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Spam protection of a single parser: admits at most one real fetch per
/// window. Calls rejected here are served from the parser's last result.
pub struct SpamGuard {
    // None when the window is zero, i.e. throttling is off.
    limiter: Option<SpecificGovernorRateLimiter>,
    window: Duration,
}

impl SpamGuard {
    pub fn new(window: Duration) -> Self {
        let limiter = Quota::with_period(window).map(GovernorRateLimiter::direct);
        Self { limiter, window }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns true if a fetch may happen now, consuming the window.
    pub fn try_acquire(&self) -> bool {
        match &self.limiter {
            Some(limiter) => {
                let admitted = limiter.check().is_ok();
                if !admitted {
                    debug!("spam protection active ({:?} window)", self.window);
                }
                admitted
            }
            None => true,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

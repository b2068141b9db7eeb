use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Spacing the public OSRM demo server tolerates from a single page.
pub const ROUTING_REQUEST_SPACING: Duration = Duration::from_millis(200);

/// One permit per `period`, no burst. A zero period falls back to one per second.
pub fn spaced_limiter(period: Duration) -> Limiter {
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(quota))
}

pub fn routing_limiter() -> Limiter {
    spaced_limiter(ROUTING_REQUEST_SPACING)
}

use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use std::{num::NonZeroU32, time::Duration};

// The site sees at most one request in this window no matter how high the
// per second quota is set.
const MS_BETWEEN_REQ: Duration = Duration::from_millis(250);

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

pub struct RateLimiter {
    req_per_sec: SpecificGovernorRateLimiter,
    ms_between_req: Option<SpecificGovernorRateLimiter>,
}

impl RateLimiter {
    pub fn new(req_per_sec: NonZeroU32) -> Self {
        // Limit to X total req/sec on average.
        let req_per_sec = GovernorRateLimiter::direct(Quota::per_second(req_per_sec));

        // No two requests closer than Y ms.
        let ms_between_req = Quota::with_period(MS_BETWEEN_REQ).map(GovernorRateLimiter::direct);

        RateLimiter {
            req_per_sec,
            ms_between_req,
        }
    }

    pub async fn wait_until_ready(&self) {
        // Everything here runs one request at a time, so awaiting the average
        // quota before the spacing quota can't let a burst through.
        self.req_per_sec.until_ready().await;
        if let Some(ms_between_req) = &self.ms_between_req {
            ms_between_req.until_ready().await;
        }
    }
}

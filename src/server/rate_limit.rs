use axum::{
    extract::{ Request, State },
    http::StatusCode,
    middleware::Next,
    response::{ IntoResponse, Response },
};
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use log::warn;
use std::num::NonZeroU32;
use std::sync::Arc;

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Global limiter allowing `per_minute` requests; `None` when limiting is off.
pub fn rate_limiter(per_minute: u32) -> Option<SharedRateLimiter> {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute)?);
    Some(Arc::new(RateLimiter::direct(quota)))
}

pub async fn enforce_rate_limit(
    State(limiter): State<SharedRateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.check().is_err() {
        warn!("Rate limit exceeded for {} {}", req.method(), req.uri().path());
        return (StatusCode::TOO_MANY_REQUESTS, "Too many requests, please try again later.")
            .into_response();
    }
    next.run(req).await
}

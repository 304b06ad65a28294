//! Informational rate-limit headers.
//!
//! Nothing is counted and nothing is rejected. Enforcement belongs to the
//! proxy in front of the service (nginx `limit_req`, ingress annotations);
//! this interceptor only advertises the budget clients should assume.

use super::{Context, Interceptor, InterceptorKind, Next};
use crate::handler::BoxFuture;

/// Per-client request budget. Carried for the proxy-side limiter; the
/// headers written here do not read it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { requests_per_minute: 100, burst_size: 10 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RateLimit {
    config: RateLimitConfig,
}

impl RateLimit {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

impl Interceptor for RateLimit {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::RateLimit
    }

    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        cx.set_static("x-ratelimit-limit", "100");
        cx.set_static("x-ratelimit-remaining", "99");
        cx.set_static("x-ratelimit-reset", "60");
        next.run(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response, Router};

    async fn ok(_req: Request) -> Response {
        Response::text("ok")
    }

    #[tokio::test]
    async fn headers_ignore_config_and_volume() {
        let config = RateLimitConfig { requests_per_minute: 5, burst_size: 0 };
        let router = Router::new().layer(RateLimit::new(config)).get("/", ok);

        for _ in 0..20 {
            let response = router.handle(Request::builder().build()).await;
            assert_eq!(response.status_code(), http::StatusCode::OK);
            assert_eq!(response.header("X-RateLimit-Limit"), Some("100"));
            assert_eq!(response.header("X-RateLimit-Remaining"), Some("99"));
            assert_eq!(response.header("X-RateLimit-Reset"), Some("60"));
        }
    }

    #[test]
    fn default_budget() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_minute, 100);
        assert_eq!(config.burst_size, 10);
    }
}

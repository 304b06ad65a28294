//! Middleware layer.
//!
//! Every request runs through an ordered list of [`Interceptor`]s before it
//! reaches its handler. Each interceptor sees the per-request [`Context`],
//! may write response headers into it, and either continues with
//! [`Next::run`] or returns a response of its own to stop the chain.
//!
//! [`compose`] registers the service's standard chain, outermost first:
//!
//! ```text
//! recovery → security headers → rate limit → csrf → input validation → cors → logging → handler
//! ```
//!
//! Recovery has to be outermost so a panic anywhere below it becomes a 500.
//! The header-writing interceptors sit above the handler so their headers
//! land on every response, error responses included.

mod context;

pub mod cors;
pub mod csrf;
pub mod logging;
pub mod rate_limit;
pub mod recovery;
pub mod sanitize;
pub mod security;

use std::fmt;
use std::sync::Arc;

pub use context::Context;
pub use cors::{Cors, CorsConfig};
pub use csrf::{Csrf, CsrfConfig, SameSite};
pub use logging::Logging;
pub use rate_limit::{RateLimit, RateLimitConfig};
pub use recovery::Recovery;
pub use sanitize::InputSanitization;
pub use security::SecurityHeaders;

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::router::Router;

/// Tag identifying what an interceptor does. Used for introspection only;
/// dispatch goes through the trait object.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InterceptorKind {
    Recovery,
    Security,
    RateLimit,
    Csrf,
    InputSanitization,
    Cors,
    Logging,
    Custom,
}

impl fmt::Display for InterceptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Recovery          => "recovery",
            Self::Security          => "security",
            Self::RateLimit         => "rate_limit",
            Self::Csrf              => "csrf",
            Self::InputSanitization => "input_sanitization",
            Self::Cors              => "cors",
            Self::Logging           => "logging",
            Self::Custom            => "custom",
        })
    }
}

/// One unit of the request-processing chain.
///
/// Implementations are shared by all concurrent requests and must not keep
/// per-request state of their own; everything per-request lives in the
/// [`Context`].
pub trait Interceptor: Send + Sync + 'static {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Custom
    }

    /// Process one request. Call `next.run(cx)` to continue, or return a
    /// response directly to short-circuit.
    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a>;
}

pub(crate) type BoxedInterceptor = Arc<dyn Interceptor>;

/// The remainder of the chain after the current interceptor.
pub struct Next<'a> {
    rest: &'a [BoxedInterceptor],
    endpoint: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [BoxedInterceptor], endpoint: &'a BoxedHandler) -> Self {
        Self { rest: chain, endpoint }
    }

    /// Runs the next interceptor, or the handler once the chain is exhausted.
    pub fn run(self, cx: &'a mut Context) -> BoxFuture<'a> {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(cx, Next { rest, endpoint: self.endpoint }),
            None => self.endpoint.call(cx.take_request()),
        }
    }
}

/// Construction-time configuration for the standard chain.
#[derive(Clone, Debug, Default)]
pub struct MiddlewareConfig {
    pub rate_limit: RateLimitConfig,
    pub csrf: CsrfConfig,
    pub cors: CorsConfig,
}

/// Registers the standard interceptor chain on `router`, in order.
///
/// Fails if the CSRF or CORS configuration is invalid; nothing is
/// registered in that case.
pub fn compose(router: Router, config: &MiddlewareConfig) -> Result<Router, Error> {
    config.csrf.validate()?;
    let cors = Cors::new(config.cors.clone())?;

    Ok(router
        .layer(Recovery)
        .layer(SecurityHeaders)
        .layer(RateLimit::new(config.rate_limit.clone()))
        .layer(Csrf::new(config.csrf.clone()))
        .layer(InputSanitization)
        .layer(cors)
        .layer(Logging))
}

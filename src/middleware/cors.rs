//! Cross-origin resource sharing.
//!
//! Requests without an `Origin` header pass untouched. A request from a
//! disallowed origin is answered `403`. A preflight (`OPTIONS` carrying
//! `Access-Control-Request-Method`) from an allowed origin is answered `204`
//! here and never reaches the handler.

use std::time::Duration;

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use http::{HeaderValue, StatusCode};
use tracing::debug;

use super::{Context, Interceptor, InterceptorKind, Next};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::method::Method;
use crate::response::Response;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CorsConfig {
    /// Exact origins, or `"*"` for any.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_owned()],
            allowed_methods: vec![
                Method::Get, Method::Post, Method::Put, Method::Patch, Method::Delete, Method::Options,
            ],
            allowed_headers: [
                "Origin", "Content-Type", "Accept", "Authorization", "X-Requested-With", "X-CSRF-Token",
            ]
            .map(str::to_owned)
            .to_vec(),
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age: Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// CORS interceptor. Header values are rendered once, at construction.
#[derive(Clone, Debug)]
pub struct Cors {
    any_origin: bool,
    origins: Vec<String>,
    allow_credentials: bool,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    expose_headers: Option<HeaderValue>,
    max_age: HeaderValue,
}

impl Cors {
    pub fn new(config: CorsConfig) -> Result<Self, Error> {
        let methods = config.allowed_methods.iter().map(|m| m.as_str()).collect::<Vec<_>>();
        let expose_headers = if config.exposed_headers.is_empty() {
            None
        } else {
            Some(header_value(&config.exposed_headers.join(", "))?)
        };

        Ok(Self {
            any_origin: config.allowed_origins.iter().any(|o| o == "*"),
            allow_methods: header_value(&methods.join(", "))?,
            allow_headers: header_value(&config.allowed_headers.join(", "))?,
            expose_headers,
            max_age: HeaderValue::from(config.max_age.as_secs()),
            allow_credentials: config.allow_credentials,
            origins: config.allowed_origins,
        })
    }

    fn allows(&self, origin: &HeaderValue) -> bool {
        self.any_origin || self.origins.iter().any(|o| o.as_bytes() == origin.as_bytes())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::Config(format!("invalid cors header value `{value}`")))
}

impl Interceptor for Cors {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Cors
    }

    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        let origin = cx.request().headers().get(ORIGIN).cloned();
        let Some(origin) = origin else {
            return next.run(cx);
        };

        if !self.allows(&origin) {
            debug!(origin = ?origin, "cors origin rejected");
            return Box::pin(async { Response::status(StatusCode::FORBIDDEN) });
        }

        if self.any_origin && !self.allow_credentials {
            cx.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        } else {
            cx.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            cx.set_header(VARY, HeaderValue::from_static("Origin"));
        }
        if self.allow_credentials {
            cx.set_header(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }

        let preflight = cx.method() == http::Method::OPTIONS
            && cx.request().headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);
        if preflight {
            cx.set_header(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
            cx.set_header(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
            cx.set_header(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
            return Box::pin(async { Response::status(StatusCode::NO_CONTENT) });
        }

        if let Some(expose) = &self.expose_headers {
            cx.set_header(ACCESS_CONTROL_EXPOSE_HEADERS, expose.clone());
        }
        next.run(cx)
    }
}

//! Hardening response headers.
//!
//! Stamps a fixed set of headers on every response. `Strict-Transport-Security`
//! is only sent when the request itself arrived over TLS.

use super::{Context, Interceptor, InterceptorKind, Next};
use crate::handler::BoxFuture;

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; \
style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; \
media-src 'self'; object-src 'none'; child-src 'none'; frame-src 'none'; worker-src 'none'; \
frame-ancestors 'none'; form-action 'self'; base-uri 'self';";

pub const PERMISSIONS_POLICY: &str = "geolocation=(), microphone=(), camera=(), payment=(), \
usb=(), magnetometer=(), gyroscope=(), speaker=()";

pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains; preload";

/// Headers written unconditionally, in write order. `X-Powered-By` and
/// `Server` carry empty values, which clears them.
pub const FIXED_HEADERS: [(&str, &str); 8] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("x-powered-by", ""),
    ("server", ""),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", PERMISSIONS_POLICY),
];

/// Writes [`FIXED_HEADERS`], plus HSTS on encrypted connections. Never
/// short-circuits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityHeaders;

impl Interceptor for SecurityHeaders {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Security
    }

    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        for (name, value) in FIXED_HEADERS {
            cx.set_static(name, value);
        }
        if cx.is_secure() {
            cx.set_static("strict-transport-security", STRICT_TRANSPORT_SECURITY);
        }
        next.run(cx)
    }
}

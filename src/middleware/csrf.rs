//! CSRF advisory header.
//!
//! Requests with a side-effect-free method pass untouched. Every other method
//! gets `X-CSRF-Protection: enabled`. No token is issued, read, or compared;
//! [`CsrfConfig`] describes the cookie/header pair a token scheme would use.

use std::fmt;

use super::{Context, Interceptor, InterceptorKind, Next};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::method::Method;

/// Cookie `SameSite` attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "Strict",
            Self::Lax    => "Lax",
            Self::None   => "None",
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CsrfConfig {
    /// Token size in bytes.
    pub token_length: usize,
    pub cookie_name: String,
    pub header_name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_length: 32,
            cookie_name: "csrf_token".to_owned(),
            header_name: "X-CSRF-Token".to_owned(),
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
        }
    }
}

impl CsrfConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.token_length == 0 {
            return Err(Error::Config("csrf token length must be greater than zero".to_owned()));
        }
        if self.cookie_name.is_empty() {
            return Err(Error::Config("csrf cookie name must not be empty".to_owned()));
        }
        if self.header_name.is_empty() {
            return Err(Error::Config("csrf header name must not be empty".to_owned()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Csrf {
    config: CsrfConfig,
}

impl Csrf {
    pub fn new(config: CsrfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }
}

impl Interceptor for Csrf {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Csrf
    }

    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        let side_effect_free = Method::try_from(cx.method()).is_ok_and(Method::is_side_effect_free);
        if !side_effect_free {
            cx.set_static("x-csrf-protection", "enabled");
        }
        next.run(cx)
    }
}

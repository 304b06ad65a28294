//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};

/// An incoming HTTP request with its body fully collected.
#[derive(Debug, Default)]
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) secure: bool,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes, secure: bool) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            params: HashMap::new(),
            secure,
        }
    }

    /// Builder for requests constructed in-process rather than read off a socket.
    pub fn builder() -> RequestBuilder {
        RequestBuilder { request: Self { path: "/".to_owned(), ..Self::default() } }
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Whether the request arrived over an encrypted (TLS) connection.
    pub fn is_secure(&self) -> bool { self.secure }

    /// Case-insensitive header lookup. Values that are not visible ASCII read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/items/{id}`, `req.param("id")` on `/items/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Fluent builder for [`Request`]. Defaults to `GET /` over plaintext.
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn method(mut self, method: impl Into<http::Method>) -> Self {
        self.request.method = method.into();
        self
    }

    /// Sets the path, splitting off anything after `?` as the query string.
    pub fn uri(mut self, uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => {
                self.request.path = path.to_owned();
                self.request.query = Some(query.to_owned());
            }
            None => {
                self.request.path = uri.to_owned();
                self.request.query = None;
            }
        }
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request.headers.append(name, value);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.request.secure = secure;
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}

//! Per-request state shared by every interceptor in the chain.

use std::mem;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::request::Request;
use crate::response::Response;

/// The request being processed plus the outbound header sink.
///
/// Headers written here are buffered and merged into whatever response the
/// chain finally produces, including the 500 synthesised by the recovery
/// interceptor after a panic further down.
#[derive(Debug)]
pub struct Context {
    request: Request,
    headers: HeaderMap,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self { request, headers: HeaderMap::new() }
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn method(&self) -> &http::Method { self.request.method() }
    pub fn is_secure(&self) -> bool { self.request.is_secure() }

    /// Sets a response header; an empty `value` clears it instead.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if value.is_empty() {
            self.headers.remove(name);
        } else {
            self.headers.insert(name, value);
        }
    }

    /// [`set_header`](Self::set_header) for the built-in interceptors'
    /// literal, lowercase names.
    pub(crate) fn set_static(&mut self, name: &'static str, value: &'static str) {
        self.set_header(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    /// Headers buffered so far.
    pub fn response_headers(&self) -> &HeaderMap { &self.headers }

    /// Hands the request to the terminal handler. The context keeps the
    /// header sink; the request slot is left empty.
    pub(crate) fn take_request(&mut self) -> Request {
        mem::take(&mut self.request)
    }

    /// Merges buffered headers into `response`. Names the response already
    /// carries are left as the handler set them.
    pub(crate) fn flush(self, mut response: Response) -> Response {
        let mut merged = self.headers;
        for name in response.headers.keys() {
            merged.remove(name);
        }
        for (name, value) in &response.headers {
            merged.append(name.clone(), value.clone());
        }
        response.headers = merged;
        response
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    #[test]
    fn empty_value_clears_header() {
        let mut cx = Context::new(Request::default());
        cx.set_static("server", "item-pdp");
        assert_eq!(cx.response_headers().get("server").unwrap(), "item-pdp");

        cx.set_static("server", "");
        assert!(cx.response_headers().get("server").is_none());
    }

    #[test]
    fn mixed_case_names_are_normalised() {
        let mut cx = Context::new(Request::default());
        let name = HeaderName::from_bytes(b"X-Request-Source").unwrap();
        cx.set_header(name.clone(), HeaderValue::from_static("storefront"));
        assert_eq!(cx.response_headers().get("x-request-source").unwrap(), "storefront");

        cx.set_header(name, HeaderValue::from_static(""));
        assert!(cx.response_headers().is_empty());
    }

    #[test]
    fn flush_keeps_handler_headers_on_collision() {
        let mut cx = Context::new(Request::default());
        cx.set_static("x-frame-options", "DENY");
        cx.set_static("cache-control", "no-store");

        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header(http::header::CACHE_CONTROL, "max-age=60")
            .no_body();
        let response = cx.flush(response);

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.header("x-frame-options"), Some("DENY"));
        assert_eq!(response.header("cache-control"), Some("max-age=60"));
    }
}

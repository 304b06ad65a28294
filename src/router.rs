//! Radix-tree request router and interceptor chain.
//!
//! One tree per HTTP method. O(path-length) lookup. Interceptors registered
//! with [`Router::layer`] wrap every route, and the 404 fallback, in
//! registration order.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedInterceptor, Context, Interceptor, InterceptorKind, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router: routes plus the interceptor chain they share.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<http::Method, MatchitRouter<BoxedHandler>>,
    interceptors: Vec<BoxedInterceptor>,
    fallback: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            interceptors: Vec::new(),
            fallback: not_found.into_boxed_handler(),
        }
    }

    /// Appends an interceptor to the chain. The first one registered is the
    /// outermost.
    pub fn layer(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Kinds of the registered interceptors, outermost first.
    pub fn interceptor_kinds(&self) -> Vec<InterceptorKind> {
        self.interceptors.iter().map(|i| i.kind()).collect()
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    /// Static segments take priority over parameters.
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed or conflicts with an existing route.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method.into())
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Registers the routes added inside `f` under `prefix`.
    ///
    /// ```rust
    /// # use item_pdp::{Request, Response, Router};
    /// # async fn create(_: Request) -> Response { Response::text("") }
    /// # async fn show(_: Request) -> Response { Response::text("") }
    /// Router::new().group("/api/v1", |v1| {
    ///     v1.group("/items", |items| items.post("", create).get("/{id}", show))
    /// });
    /// ```
    pub fn group(self, prefix: &str, f: impl FnOnce(Group) -> Group) -> Self {
        f(Group { router: self, prefix: prefix.to_owned() }).router
    }

    /// Runs one request through the chain and its handler.
    pub async fn handle(&self, mut req: Request) -> Response {
        let endpoint = match self.lookup(&req.method, &req.path) {
            Some((handler, params)) => {
                req.params = params;
                handler
            }
            None => Arc::clone(&self.fallback),
        };

        let mut cx = Context::new(req);
        let response = Next::new(&self.interceptors, &endpoint).run(&mut cx).await;
        cx.flush(response)
    }

    fn lookup(
        &self,
        method: &http::Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}

/// Routes registered under a shared path prefix. See [`Router::group`].
pub struct Group {
    router: Router,
    prefix: String,
}

impl Group {
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let full = format!("{}{path}", self.prefix);
        self.router = self.router.on(method, &full, handler);
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Nested group; prefixes concatenate.
    pub fn group(self, prefix: &str, f: impl FnOnce(Group) -> Group) -> Self {
        let outer = self.prefix;
        let inner = f(Group { router: self.router, prefix: format!("{outer}{prefix}") });
        Group { router: inner.router, prefix: outer }
    }
}

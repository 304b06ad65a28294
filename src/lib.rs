//! # item-pdp
//!
//! HTTP front door for the item product-detail service: a small
//! hyper-based engine, a radix-tree router, and the ordered interceptor chain
//! every request passes through before it reaches a handler.
//!
//! ## The chain
//!
//! ```text
//! recovery → security headers → rate limit → csrf → input validation → cors → logging → handler
//! ```
//!
//! The security interceptors are advisory: they stamp headers and never
//! reject a request. Rate limiting and CSRF enforcement are left to the proxy
//! and to a future token scheme; the headers say what the service expects.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use item_pdp::middleware::{self, MiddlewareConfig};
//! use item_pdp::routes::{self, UnimplementedItems};
//! use item_pdp::{Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), item_pdp::Error> {
//!     let app = middleware::compose(Router::new(), &MiddlewareConfig::default())?;
//!     let app = routes::setup_routes(app, Arc::new(UnimplementedItems));
//!
//!     Server::bind("0.0.0.0:8080")?.serve(app).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;
pub mod routes;
pub mod tls;

pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::{Group, Router};
pub use server::Server;

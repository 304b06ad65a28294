//! Panic recovery.
//!
//! Register first. A panic in any later interceptor or in the handler is
//! caught here, logged, and answered with a bodiless `500`. Headers written
//! by interceptors before the panic stay on that response.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use super::{Context, Interceptor, InterceptorKind, Next};
use crate::handler::BoxFuture;
use crate::response::Response;

#[derive(Clone, Copy, Debug, Default)]
pub struct Recovery;

impl Interceptor for Recovery {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Recovery
    }

    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        let method = cx.method().clone();
        let path = cx.request().path().to_owned();

        Box::pin(async move {
            // Interceptors do their work synchronously inside `next.run`, so the
            // call itself has to happen inside the guarded future.
            let guarded = AssertUnwindSafe(async move { next.run(cx).await });
            match guarded.catch_unwind().await {
                Ok(response) => response,
                Err(payload) => {
                    error!(%method, %path, panic = panic_message(&*payload), "request panicked");
                    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

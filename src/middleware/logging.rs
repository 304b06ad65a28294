//! Access log: one event per request with method, path, status and latency.

use std::time::Instant;

use tracing::{info, warn};

use super::{Context, Interceptor, InterceptorKind, Next};
use crate::handler::BoxFuture;

#[derive(Clone, Copy, Debug, Default)]
pub struct Logging;

impl Interceptor for Logging {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Logging
    }

    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        let method = cx.method().clone();
        let path = cx.request().path().to_owned();
        let secure = cx.is_secure();
        let start = Instant::now();

        Box::pin(async move {
            let response = next.run(cx).await;
            let status = response.status_code().as_u16();
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            if response.status_code().is_server_error() {
                warn!(%method, %path, status, latency_ms, secure, "request failed");
            } else {
                info!(%method, %path, status, latency_ms, secure, "request completed");
            }
            response
        })
    }
}

//! Input-validation advisory header.

use super::{Context, Interceptor, InterceptorKind, Next};
use crate::handler::BoxFuture;

/// Writes `X-Input-Validation: enabled` on every response. The request body,
/// query and path are not inspected; validation is the handlers' job.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputSanitization;

impl Interceptor for InputSanitization {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::InputSanitization
    }

    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        cx.set_static("x-input-validation", "enabled");
        next.run(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response, Router};

    async fn echo(req: Request) -> Response {
        Response::json(req.body().to_vec())
    }

    #[tokio::test]
    async fn body_reaches_handler_unchanged() {
        let router = Router::new().layer(InputSanitization).post("/", echo);
        let body = r#"{"name":"<script>alert(1)</script>"}"#;

        let response = router
            .handle(Request::builder().method(http::Method::POST).body(body).build())
            .await;

        assert_eq!(response.header("X-Input-Validation"), Some("enabled"));
        assert_eq!(response.body(), body.as_bytes());
    }
}

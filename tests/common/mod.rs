//! Shared helpers for integration tests.

use std::sync::{Arc, Mutex};

use http::StatusCode;
use serde_json::json;

use item_pdp::middleware::{self, MiddlewareConfig};
use item_pdp::routes::{self, ItemHandler, ItemOperation};
use item_pdp::{BoxFuture, IntoResponse, Json, Request, Router};

/// Records every operation it is asked to perform and answers with a JSON
/// echo of the operation, path params and body length.
#[derive(Default)]
pub struct RecordingItems {
    calls: Mutex<Vec<ItemOperation>>,
}

impl RecordingItems {
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<ItemOperation> {
        self.calls.lock().unwrap().clone()
    }
}

impl ItemHandler for RecordingItems {
    fn handle(&self, op: ItemOperation, req: Request) -> BoxFuture<'static> {
        self.calls.lock().unwrap().push(op);
        let status = match op {
            ItemOperation::CreateItem => StatusCode::CREATED,
            _ => StatusCode::OK,
        };
        let body = json!({
            "operation": op.as_str(),
            "id": req.param("id"),
            "sku": req.param("sku"),
            "category": req.param("category"),
            "body_len": req.body().len(),
        });
        Box::pin(async move { (status, Json(body)).into_response() })
    }
}

/// The fully composed service: standard chain plus the route table.
#[allow(dead_code)]
pub fn app() -> (Router, Arc<RecordingItems>) {
    let items = Arc::new(RecordingItems::default());
    let router = middleware::compose(Router::new(), &MiddlewareConfig::default()).unwrap();
    let router = routes::setup_routes(router, items.clone());
    (router, items)
}

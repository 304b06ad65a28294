//! Health-check handler.
//!
//! ```rust,no_run
//! use item_pdp::{Router, health};
//!
//! let app = Router::new().get("/health", health::status);
//! ```

use serde::Serialize;

use crate::response::Json;
use crate::Request;

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "item-pdp-service";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
}

/// Always `200 OK` with `{"status":"healthy","service":"item-pdp-service"}`.
/// If the process can answer HTTP at all it is healthy; no dependencies are
/// consulted.
pub async fn status(_req: Request) -> Json<HealthStatus> {
    Json(HealthStatus { status: "healthy", service: SERVICE_NAME })
}

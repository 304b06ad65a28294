//! Route table for the item service.
//!
//! The item, token and admin endpoints are served by an [`ItemHandler`]
//! supplied by the caller; this module only decides which path reaches which
//! [`ItemOperation`]. No route here is guarded by an authorization
//! interceptor, `/admin/execute` included.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde_json::json;

use crate::handler::BoxFuture;
use crate::health;
use crate::request::Request;
use crate::response::{IntoResponse, Json};
use crate::router::Router;

/// Every operation reachable through the item routes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ItemOperation {
    CreateItem,
    GetItem,
    UpdateItem,
    DeleteItem,
    GetItemBySku,
    UpdateInventory,
    AddImage,
    ActivateItem,
    DeactivateItem,
    SearchItems,
    GetItemsByCategory,
    GetAvailableItems,
    GenerateToken,
    ExecuteSystemCommand,
}

impl ItemOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateItem           => "create_item",
            Self::GetItem              => "get_item",
            Self::UpdateItem           => "update_item",
            Self::DeleteItem           => "delete_item",
            Self::GetItemBySku         => "get_item_by_sku",
            Self::UpdateInventory      => "update_inventory",
            Self::AddImage             => "add_image",
            Self::ActivateItem         => "activate_item",
            Self::DeactivateItem       => "deactivate_item",
            Self::SearchItems          => "search_items",
            Self::GetItemsByCategory   => "get_items_by_category",
            Self::GetAvailableItems    => "get_available_items",
            Self::GenerateToken        => "generate_token",
            Self::ExecuteSystemCommand => "execute_system_command",
        }
    }
}

impl fmt::Display for ItemOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business-logic collaborator behind the item routes. Path parameters are
/// available through [`Request::param`].
pub trait ItemHandler: Send + Sync + 'static {
    fn handle(&self, op: ItemOperation, req: Request) -> BoxFuture<'static>;
}

/// Answers every operation with `501` and a JSON body naming it.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnimplementedItems;

impl ItemHandler for UnimplementedItems {
    fn handle(&self, op: ItemOperation, _req: Request) -> BoxFuture<'static> {
        Box::pin(async move {
            let body = json!({ "error": "not implemented", "operation": op.as_str() });
            (StatusCode::NOT_IMPLEMENTED, Json(body)).into_response()
        })
    }
}

/// Registers the health check, the `/api/v1/items` group, `/auth/token`
/// and `/admin/execute` on `router`.
pub fn setup_routes(router: Router, items: Arc<dyn ItemHandler>) -> Router {
    let op = |operation: ItemOperation| {
        let items = Arc::clone(&items);
        move |req: Request| items.handle(operation, req)
    };

    router
        .get("/health", health::status)
        .group("/api/v1", |v1| {
            v1.group("/items", |g| {
                g.post("", op(ItemOperation::CreateItem))
                    .get("/{id}", op(ItemOperation::GetItem))
                    .put("/{id}", op(ItemOperation::UpdateItem))
                    .delete("/{id}", op(ItemOperation::DeleteItem))
                    .get("/sku/{sku}", op(ItemOperation::GetItemBySku))
                    .patch("/{id}/inventory", op(ItemOperation::UpdateInventory))
                    .post("/{id}/images", op(ItemOperation::AddImage))
                    .patch("/{id}/activate", op(ItemOperation::ActivateItem))
                    .patch("/{id}/deactivate", op(ItemOperation::DeactivateItem))
                    .get("/search", op(ItemOperation::SearchItems))
                    .get("/category/{category}", op(ItemOperation::GetItemsByCategory))
                    .get("/available", op(ItemOperation::GetAvailableItems))
            })
        })
        .group("/auth", |auth| auth.post("/token", op(ItemOperation::GenerateToken)))
        .group("/admin", |admin| admin.post("/execute", op(ItemOperation::ExecuteSystemCommand)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unimplemented_names_the_operation() {
        let router = setup_routes(Router::new(), Arc::new(UnimplementedItems));
        let response = router
            .handle(Request::builder().method(http::Method::PATCH).uri("/api/v1/items/7/activate").build())
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_IMPLEMENTED);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["operation"], "activate_item");
    }
}

//! Route table: every path reaches the operation it names.

mod common;

use http::StatusCode;

use item_pdp::Request;
use item_pdp::routes::ItemOperation;

use common::app;

#[tokio::test]
async fn every_route_reaches_its_operation() {
    let cases = [
        (http::Method::POST, "/api/v1/items", ItemOperation::CreateItem),
        (http::Method::GET, "/api/v1/items/42", ItemOperation::GetItem),
        (http::Method::PUT, "/api/v1/items/42", ItemOperation::UpdateItem),
        (http::Method::DELETE, "/api/v1/items/42", ItemOperation::DeleteItem),
        (http::Method::GET, "/api/v1/items/sku/LAMP-01", ItemOperation::GetItemBySku),
        (http::Method::PATCH, "/api/v1/items/42/inventory", ItemOperation::UpdateInventory),
        (http::Method::POST, "/api/v1/items/42/images", ItemOperation::AddImage),
        (http::Method::PATCH, "/api/v1/items/42/activate", ItemOperation::ActivateItem),
        (http::Method::PATCH, "/api/v1/items/42/deactivate", ItemOperation::DeactivateItem),
        (http::Method::GET, "/api/v1/items/search", ItemOperation::SearchItems),
        (http::Method::GET, "/api/v1/items/category/lighting", ItemOperation::GetItemsByCategory),
        (http::Method::GET, "/api/v1/items/available", ItemOperation::GetAvailableItems),
        (http::Method::POST, "/auth/token", ItemOperation::GenerateToken),
        (http::Method::POST, "/admin/execute", ItemOperation::ExecuteSystemCommand),
    ];

    let (router, items) = app();
    for (method, path, _) in &cases {
        let response = router
            .handle(Request::builder().method(method.clone()).uri(path).build())
            .await;
        assert!(response.status_code().is_success(), "{method} {path}");
    }

    let expected: Vec<ItemOperation> = cases.iter().map(|(_, _, op)| *op).collect();
    assert_eq!(items.calls(), expected);
}

#[tokio::test]
async fn path_params_reach_handler() {
    let (router, _) = app();

    let by_sku = router.handle(Request::builder().uri("/api/v1/items/sku/LAMP-01").build()).await;
    let body: serde_json::Value = serde_json::from_slice(by_sku.body()).unwrap();
    assert_eq!(body["sku"], "LAMP-01");

    let by_category = router
        .handle(Request::builder().uri("/api/v1/items/category/lighting").build())
        .await;
    let body: serde_json::Value = serde_json::from_slice(by_category.body()).unwrap();
    assert_eq!(body["category"], "lighting");
}

#[tokio::test]
async fn admin_execute_is_not_guarded() {
    let (router, items) = app();
    let response = router
        .handle(
            Request::builder()
                .method(http::Method::POST)
                .uri("/admin/execute")
                .body(r#"{"command":"uptime"}"#)
                .build(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(items.calls(), vec![ItemOperation::ExecuteSystemCommand]);
    assert_eq!(response.header("X-CSRF-Protection"), Some("enabled"));
}

#[tokio::test]
async fn items_collection_only_accepts_post() {
    let (router, items) = app();
    let response = router.handle(Request::builder().uri("/api/v1/items").build()).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(items.calls().is_empty());
}

use super::*;
use axum::{body, body::Body, http::Request};
use serde_json::json;
use tower::ServiceExt;

async fn test_app() -> (Router, Storage) {
    test_app_with_limit(config::DEFAULT_MAX_DOCUMENT_BYTES).await
}

async fn test_app_with_limit(max_document_bytes: usize) -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let app = build_router(
        Arc::new(AppState {
            api: ApiContext {
                storage: storage.clone(),
            },
        }),
        max_document_bytes,
    );
    (app, storage)
}

fn put_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn put_get_list_and_delete_round_trip() {
    let (app, _storage) = test_app().await;

    let put = put_request(
        "/collections/todoItems/documents/item-1",
        json!({ "id": "item-1", "name": "Buy milk" }),
    );
    let response = app.clone().oneshot(put).await.expect("put response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let get = Request::get("/collections/todoItems/documents/item-1")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(get).await.expect("get response");
    assert_eq!(response.status(), StatusCode::OK);
    let record: DocumentRecord = read_json(response).await;
    assert_eq!(record.key, "item-1");
    assert_eq!(record.data["name"], "Buy milk");

    let list = Request::get("/collections/todoItems/documents")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(list).await.expect("list response");
    assert_eq!(response.status(), StatusCode::OK);
    let records: Vec<DocumentRecord> = read_json(response).await;
    assert_eq!(records.len(), 1);

    for _ in 0..2 {
        let delete = Request::delete("/collections/todoItems/documents/item-1")
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(delete).await.expect("delete response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let get = Request::get("/collections/todoItems/documents/item-1")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(get).await.expect("get response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn invalid_collection_name_is_bad_request() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/collections/bad%20name/documents")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_object_document_is_bad_request() {
    let (app, storage) = test_app().await;
    let response = app
        .oneshot(put_request("/collections/todoItems/documents/x", json!(42)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(storage
        .list_documents("todoItems")
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn oversized_document_is_rejected() {
    let (app, storage) = test_app_with_limit(64).await;
    let response = app
        .oneshot(put_request(
            "/collections/todoItems/documents/big",
            json!({ "notes": "x".repeat(512) }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::PayloadTooLarge);
    assert!(storage
        .get_document("todoItems", "big")
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn oversized_document_with_content_length_gets_api_error_body() {
    let (app, _storage) = test_app_with_limit(64).await;
    let body = json!({ "notes": "x".repeat(512) }).to_string();
    let response = app
        .oneshot(
            Request::put("/collections/todoItems/documents/big")
                .header("content-type", "application/json")
                .header("content-length", body.len().to_string())
                .body(Body::from(body))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::PayloadTooLarge);
}

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::DocumentRecord,
};

use super::*;

type Documents = Arc<Mutex<BTreeMap<(String, String), Value>>>;

async fn list(
    State(documents): State<Documents>,
    Path(collection): Path<String>,
) -> Json<Vec<DocumentRecord>> {
    let documents = documents.lock().expect("lock");
    Json(
        documents
            .iter()
            .filter(|((name, _), _)| *name == collection)
            .map(|((_, key), data)| DocumentRecord {
                key: key.clone(),
                data: data.clone(),
                updated_at: Utc::now(),
            })
            .collect(),
    )
}

async fn fetch(
    State(documents): State<Documents>,
    Path((collection, key)): Path<(String, String)>,
) -> Result<Json<DocumentRecord>, (StatusCode, Json<ApiError>)> {
    let documents = documents.lock().expect("lock");
    documents
        .get(&(collection, key.clone()))
        .map(|data| {
            Json(DocumentRecord {
                key,
                data: data.clone(),
                updated_at: Utc::now(),
            })
        })
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, "document not found")),
        ))
}

async fn store(
    State(documents): State<Documents>,
    Path((collection, key)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    if key == "forbidden" {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, "key is reserved")),
        ));
    }
    documents.lock().expect("lock").insert((collection, key), body);
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(documents): State<Documents>,
    Path((collection, key)): Path<(String, String)>,
) -> StatusCode {
    match documents.lock().expect("lock").remove(&(collection, key)) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn spawn_stub() -> String {
    let documents: Documents = Arc::default();
    let app = Router::new()
        .route("/collections/:collection/documents", get(list))
        .route(
            "/collections/:collection/documents/:key",
            get(fetch).put(store).delete(remove),
        )
        .with_state(documents);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn set_get_and_list_round_trip_through_http() {
    let server_url = spawn_stub().await;
    let collection = HttpDocumentCollection::new(&server_url, "todoItems").expect("client");

    collection
        .set("item-1", json!({ "name": "Buy milk" }))
        .await
        .expect("set");

    let fetched = collection.get("item-1").await.expect("get");
    assert_eq!(fetched, Some(json!({ "name": "Buy milk" })));

    let all = collection.get_all().await.expect("get_all");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].key, "item-1");
    assert_eq!(collection.name(), "todoItems");
}

#[tokio::test]
async fn collections_are_isolated_by_name() {
    let server_url = spawn_stub().await;
    let todos = HttpDocumentCollection::new(&server_url, "todoItems").expect("client");
    let other = HttpDocumentCollection::new(&server_url, "other").expect("client");

    todos.set("a", json!({})).await.expect("set");

    assert!(other.get_all().await.expect("get_all").is_empty());
    assert_eq!(other.get("a").await.expect("get"), None);
}

#[tokio::test]
async fn missing_documents_are_absent_and_deletes_are_idempotent() {
    let server_url = spawn_stub().await;
    let collection = HttpDocumentCollection::new(&server_url, "todoItems").expect("client");

    assert_eq!(collection.get("nope").await.expect("get"), None);
    collection.delete("nope").await.expect("delete absent");

    collection.set("gone", json!({})).await.expect("set");
    collection.delete("gone").await.expect("delete");
    assert_eq!(collection.get("gone").await.expect("get"), None);
}

#[tokio::test]
async fn rejected_requests_carry_the_server_message() {
    let server_url = spawn_stub().await;
    let collection = HttpDocumentCollection::new(&server_url, "todoItems").expect("client");

    let error = collection
        .set("forbidden", json!({}))
        .await
        .expect_err("rejected");

    match error {
        StoreError::Rejected {
            operation,
            status,
            message,
        } => {
            assert_eq!(operation, "set");
            assert_eq!(status, 400);
            assert_eq!(message, "key is reserved");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let collection =
        HttpDocumentCollection::new(&format!("http://{addr}"), "todoItems").expect("client");
    let error = collection.get_all().await.expect_err("connection refused");
    assert!(matches!(error, StoreError::Transport { operation: "get_all", .. }));
    assert!(error.is_transport());
}

#[test]
fn urls_keep_a_server_path_prefix() {
    let collection =
        HttpDocumentCollection::new("http://localhost:8443/store/", "todoItems").expect("client");
    let url = collection.document_url("item 1").expect("url");
    assert_eq!(
        url.as_str(),
        "http://localhost:8443/store/collections/todoItems/documents/item%201"
    );
}

#[test]
fn invalid_server_urls_are_rejected() {
    assert!(matches!(
        HttpDocumentCollection::new("not a url", "todoItems"),
        Err(StoreError::InvalidUrl(_))
    ));
    assert!(matches!(
        HttpDocumentCollection::new("mailto:someone@example.com", "todoItems"),
        Err(StoreError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn dot_segment_keys_are_refused_before_sending() {
    let server_url = spawn_stub().await;
    let collection = HttpDocumentCollection::new(&server_url, "todoItems").expect("client");

    for key in [".", ".."] {
        assert!(matches!(
            collection.get(key).await,
            Err(StoreError::InvalidKey(ref rejected)) if rejected == key
        ));
        assert!(matches!(
            collection.set(key, json!({})).await,
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            collection.delete(key).await,
            Err(StoreError::InvalidKey(_))
        ));
    }
    assert!(collection.get_all().await.expect("get_all").is_empty());
}

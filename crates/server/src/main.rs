use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::DocumentRecord,
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::{load_settings, prepare_database_url};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_document_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, max_document_bytes = settings.max_document_bytes, "document store listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_document_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/collections/:collection/documents",
            get(http_list_documents),
        )
        .route(
            "/collections/:collection/documents/:key",
            get(http_get_document)
                .put(http_put_document)
                .delete(http_delete_document),
        )
        .layer(RequestBodyLimitLayer::new(max_document_bytes))
        .layer(middleware::map_response(payload_too_large_as_api_error))
        .with_state(state)
}

// Rewrites the body limit's plain-text 413 as an ApiError body.
async fn payload_too_large_as_api_error(response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    error_response(ApiError::new(
        ErrorCode::PayloadTooLarge,
        "document exceeds the size limit",
    ))
    .into_response()
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.storage.health_check().await.map_err(|e| {
        error_response(ApiError::new(ErrorCode::Internal, e.to_string()))
    })?;
    Ok("ok")
}

async fn http_list_documents(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> ApiResult<Json<Vec<DocumentRecord>>> {
    let documents = api::list_documents(&state.api, &collection)
        .await
        .map_err(error_response)?;
    Ok(Json(documents))
}

async fn http_get_document(
    State(state): State<Arc<AppState>>,
    Path((collection, key)): Path<(String, String)>,
) -> ApiResult<Json<DocumentRecord>> {
    let document = api::get_document(&state.api, &collection, &key)
        .await
        .map_err(error_response)?;
    Ok(Json(document))
}

async fn http_put_document(
    State(state): State<Arc<AppState>>,
    Path((collection, key)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<StatusCode> {
    api::put_document(&state.api, &collection, &key, body)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_delete_document(
    State(state): State<Arc<AppState>>,
    Path((collection, key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    api::delete_document(&state.api, &collection, &key)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

fn error_response(error: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match error.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

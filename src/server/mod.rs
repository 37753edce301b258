//! HTTP backend for the remote store variant.
//!
//! Three routes over the document table:
//! - `GET /get` lists every entry as `{ allData }`
//! - `POST /add` stores an entry under a fresh identity
//! - `DELETE /delete/:id` removes an entry; unknown ids still answer `Deleted`

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::journal::{Entry, NewEntry};
use crate::storage::{DocumentStore, PersistenceError};

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(rename = "allData")]
    pub all_data: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("entry rejected: {0}")]
    Rejected(String),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Rejected(detail) => {
                tracing::warn!(%detail, "rejected entry");
            }
            other => {
                tracing::error!(error = %other, "backend internal error");
            }
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::new("Something went wrong")),
        )
            .into_response()
    }
}

pub fn router(documents: DocumentStore) -> Router {
    Router::new()
        .route("/get", get(list_entries))
        .route("/add", post(add_entry))
        .route("/delete/:id", delete(delete_entry))
        .layer(CorsLayer::permissive())
        .with_state(documents)
}

async fn list_entries(State(documents): State<DocumentStore>) -> Result<Json<ListResponse>, ApiError> {
    let all_data = tokio::task::spawn_blocking(move || documents.find_all()).await??;
    Ok(Json(ListResponse { all_data }))
}

async fn add_entry(
    State(documents): State<DocumentStore>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(mut doc) = payload.map_err(|rejection| ApiError::Rejected(rejection.body_text()))?;
    doc.symptom = doc.symptom.trim().to_string();
    if doc.symptom.is_empty() {
        return Err(ApiError::Rejected("symptom is required".into()));
    }
    let saved = tokio::task::spawn_blocking(move || documents.insert(doc)).await??;
    tracing::debug!(id = %saved.id, "entry saved");
    Ok(Json(MessageResponse::new("Entry saved")))
}

async fn delete_entry(
    State(documents): State<DocumentStore>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let lookup = id.clone();
    let removed = tokio::task::spawn_blocking(move || documents.delete_one(&lookup)).await??;
    tracing::debug!(%id, removed, "delete handled");
    Ok(Json(MessageResponse::new("Deleted")))
}

pub async fn serve(bind: &str, documents: DocumentStore) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    let addr = listener.local_addr().context("reading bound address")?;
    tracing::info!(%addr, "backend listening");
    axum::serve(listener, router(documents))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;
    tracing::info!("backend stopped");
    Ok(())
}

/// Blocking wrapper used by the CLI.
pub fn run(bind: &str, documents: DocumentStore) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(serve(bind, documents))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "listening for ctrl-c failed");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageOptions;
    use crate::storage::{conformance, init};
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router() -> (TempDir, Router) {
        let temp = TempDir::new().expect("temp dir");
        let storage = init(&temp.path().join("server.db"), &StorageOptions::default())
            .expect("init storage");
        (temp, router(DocumentStore::new(storage)))
    }

    fn json_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn add_then_get_returns_saved_entry() {
        let (_temp, app) = test_router();
        let entry = serde_json::to_value(conformance::entry("client", 6)).expect("json");

        let response = app
            .clone()
            .oneshot(json_request("POST", "/add", Some(entry)))
            .await
            .expect("add");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Entry saved");

        let response = app
            .oneshot(json_request("GET", "/get", None))
            .await
            .expect("get");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let all = json["allData"].as_array().expect("allData array");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["severity"], 6);
        assert_ne!(all[0]["id"], "client");
    }

    #[tokio::test]
    async fn delete_unknown_id_still_succeeds() {
        let (_temp, app) = test_router();
        let response = app
            .oneshot(json_request("DELETE", "/delete/does-not-exist", None))
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Deleted");
    }

    #[tokio::test]
    async fn invalid_entries_are_rejected_with_server_error() {
        let (_temp, app) = test_router();
        let mut blank = serde_json::to_value(conformance::entry("x", 4)).expect("json");
        blank["symptom"] = "   ".into();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/add", Some(blank)))
            .await
            .expect("add blank");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let mut out_of_range = serde_json::to_value(conformance::entry("x", 4)).expect("json");
        out_of_range["severity"] = 12.into();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/add", Some(out_of_range)))
            .await
            .expect("add out of range");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Something went wrong");

        let response = app
            .oneshot(json_request("GET", "/get", None))
            .await
            .expect("get");
        let json = body_json(response).await;
        assert!(json["allData"].as_array().expect("array").is_empty());
    }
}

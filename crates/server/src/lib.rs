//! Server runtime: thin JSON HTTP surface over a [`RecordStore`].

pub mod store;

pub use store::{ProviderKind, Store, StoreConfig, StoreError, DEFAULT_RECORDS_PATH};

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use schemashare_core::{is_well_formed, validate_payload, RecordStore, MAX_PAYLOAD_BYTES};
use serde::Deserialize;
use serde_json::json;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const NOT_FOUND_MESSAGE: &str = "not found or expired";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(String),
}

#[derive(Clone, Debug)]
pub struct ServerOptions {
    /// Label reported by `/healthz`.
    pub provider: String,
    pub max_payload_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Embedded.as_str().to_string(),
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaveRequest {
    schema: String,
    json: String,
}

pub struct Server<S> {
    store: Arc<S>,
    options: ServerOptions,
}

impl<S> Clone for Server<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            options: self.options.clone(),
        }
    }
}

impl<S> Server<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: S) -> Self {
        Self::new_with_options(store, ServerOptions::default())
    }

    pub fn new_with_options(store: S, options: ServerOptions) -> Self {
        Self::from_shared(Arc::new(store), options)
    }

    pub fn from_shared(store: Arc<S>, options: ServerOptions) -> Self {
        Self { store, options }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/healthz", get(healthz::<S>))
            .route("/api/validations", post(create_validation::<S>))
            .route("/api/validations/:id", get(fetch_validation::<S>))
            .layer(DefaultBodyLimit::max(self.options.max_body_bytes))
            .with_state(self.clone())
    }

    pub async fn run_http(&self, addr: &str) -> Result<(), ServerError> {
        let bind_addr: SocketAddr = addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::Io(e.to_string()))?;
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .map_err(|e| ServerError::Io(e.to_string()))?;

        let shutdown_token = CancellationToken::new();
        let server_shutdown = shutdown_token.child_token();
        info!(%addr, provider = %self.options.provider, "http server listening");
        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                server_shutdown.cancelled().await;
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            res = &mut server => {
                res.map_err(|e| ServerError::Io(e.to_string()))
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl_c received; shutting down http server");
                shutdown_token.cancel();
                server.as_mut().await.map_err(|e| ServerError::Io(e.to_string()))
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn healthz<S>(State(server): State<Server<S>>) -> Json<serde_json::Value>
where
    S: RecordStore + 'static,
{
    Json(json!({ "status": "ok", "provider": server.options.provider }))
}

async fn create_validation<S>(
    State(server): State<Server<S>>,
    Json(req): Json<SaveRequest>,
) -> Response
where
    S: RecordStore + 'static,
{
    if let Err(e) = validate_payload(&req.schema, &req.json, server.options.max_payload_bytes) {
        debug!(error = %e, "rejected save request");
        return error_body(StatusCode::BAD_REQUEST, &e.to_string());
    }
    match server.store.save(&req.schema, &req.json).await {
        Ok(id) => {
            let path = format!("/v/{id}");
            (StatusCode::CREATED, Json(json!({ "id": id, "path": path }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "save failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

async fn fetch_validation<S>(
    State(server): State<Server<S>>,
    Path(id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    if !is_well_formed(&id) {
        return error_body(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE);
    }
    match server.store.get(&id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_body(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
        Err(e) => {
            error!(error = %e, record_id = %id, "get failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

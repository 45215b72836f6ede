//! HTTP catalog server for REST adapter tests.
//!
//! Serves any [`CatalogClient`] over the `/v1/databases` routes on
//! `127.0.0.1:0`, so `RestCatalogClient` can be tested against real HTTP.
//! Transient statuses can be queued to exercise client retries, either before
//! the catalog sees a request or after it has already applied it.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tablesync_core::{
    CatalogClient, CatalogError, CreateDatabaseRequest, CreateTableRequest, GetDatabaseRequest,
    GetTableRequest, TableInput, UpdateTableRequest,
};
use tokio::sync::oneshot;

pub use axum::http::StatusCode as HttpStatus;

#[derive(Clone)]
struct ServerState {
    catalog: Arc<dyn CatalogClient>,
    injected: Arc<Mutex<VecDeque<StatusCode>>>,
    lost: Arc<Mutex<VecDeque<StatusCode>>>,
    requests: Arc<AtomicUsize>,
    token: Option<String>,
}

impl ServerState {
    /// Counts the request, then applies auth and any queued status.
    fn gate(&self, headers: &HeaderMap) -> Option<Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(token) = &self.token {
            let expected = format!("Bearer {token}");
            let presented = headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok());
            if presented != Some(expected.as_str()) {
                return Some(error_body(StatusCode::UNAUTHORIZED, "missing or invalid token"));
            }
        }

        self.injected
            .lock()
            .expect("lock")
            .pop_front()
            .map(|status| error_body(status, "injected failure"))
    }

    /// Swaps a handled response for a queued status, if any.
    fn finish(&self, response: Response) -> Response {
        match self.lost.lock().expect("lock").pop_front() {
            Some(status) => error_body(status, "response lost after commit"),
            None => response,
        }
    }
}

/// A running HTTP catalog server. Shuts down on drop.
pub struct CatalogHttpServer {
    base_url: String,
    injected: Arc<Mutex<VecDeque<StatusCode>>>,
    lost: Arc<Mutex<VecDeque<StatusCode>>>,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for CatalogHttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogHttpServer")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CatalogHttpServer {
    /// Starts a server without authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(catalog: Arc<dyn CatalogClient>) -> std::io::Result<Self> {
        Self::start_inner(catalog, None).await
    }

    /// Starts a server that requires `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start_with_token(
        catalog: Arc<dyn CatalogClient>,
        token: impl Into<String>,
    ) -> std::io::Result<Self> {
        Self::start_inner(catalog, Some(token.into())).await
    }

    async fn start_inner(
        catalog: Arc<dyn CatalogClient>,
        token: Option<String>,
    ) -> std::io::Result<Self> {
        let injected = Arc::new(Mutex::new(VecDeque::new()));
        let lost = Arc::new(Mutex::new(VecDeque::new()));
        let requests = Arc::new(AtomicUsize::new(0));
        let state = ServerState {
            catalog,
            injected: Arc::clone(&injected),
            lost: Arc::clone(&lost),
            requests: Arc::clone(&requests),
            token,
        };

        let app = Router::new()
            .route("/v1/databases", post(create_database))
            .route("/v1/databases/:database", get(get_database))
            .route("/v1/databases/:database/tables", post(create_table))
            .route(
                "/v1/databases/:database/tables/:table",
                get(get_table).put(update_table),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            injected,
            lost,
            requests,
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        })
    }

    /// Returns the server base URL (e.g., `http://127.0.0.1:12345`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answers the next `times` requests with `status` before serving normally.
    pub fn fail_next(&self, status: StatusCode, times: usize) {
        let mut injected = self.injected.lock().expect("lock");
        for _ in 0..times {
            injected.push_back(status);
        }
    }

    /// Lets the next `times` requests reach the catalog, then answers them
    /// with `status` as if the response had been lost in transit.
    pub fn fail_after_commit(&self, status: StatusCode, times: usize) {
        let mut lost = self.lost.lock().expect("lock");
        for _ in 0..times {
            lost.push_back(status);
        }
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for CatalogHttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn error_response(err: &CatalogError) -> Response {
    let status = match err {
        CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
        CatalogError::AlreadyExists { .. } => StatusCode::CONFLICT,
        CatalogError::AccessDenied { .. } => StatusCode::FORBIDDEN,
        CatalogError::Rejected { .. } | CatalogError::Serialization { .. } => {
            StatusCode::BAD_REQUEST
        }
        CatalogError::Transport {
            retryable: true, ..
        } => StatusCode::SERVICE_UNAVAILABLE,
        CatalogError::Transport { .. } => StatusCode::BAD_GATEWAY,
        CatalogError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, &err.to_string())
}

async fn get_database(
    State(state): State<ServerState>,
    Path(database): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = state.gate(&headers) {
        return rejection;
    }
    let response = match state
        .catalog
        .get_database(&GetDatabaseRequest::new(database))
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response(&err),
    };
    state.finish(response)
}

async fn create_database(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<CreateDatabaseRequest>,
) -> Response {
    if let Some(rejection) = state.gate(&headers) {
        return rejection;
    }
    let response = match state.catalog.create_database(&request).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => error_response(&err),
    };
    state.finish(response)
}

async fn get_table(
    State(state): State<ServerState>,
    Path((database, table)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = state.gate(&headers) {
        return rejection;
    }
    let request = GetTableRequest {
        database,
        name: table,
    };
    let response = match state.catalog.get_table(&request).await {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response(&err),
    };
    state.finish(response)
}

async fn create_table(
    State(state): State<ServerState>,
    Path(database): Path<String>,
    headers: HeaderMap,
    Json(table): Json<TableInput>,
) -> Response {
    if let Some(rejection) = state.gate(&headers) {
        return rejection;
    }
    let response = match state
        .catalog
        .create_table(&CreateTableRequest::new(database, table))
        .await
    {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => error_response(&err),
    };
    state.finish(response)
}

async fn update_table(
    State(state): State<ServerState>,
    Path((database, table_name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(mut table): Json<TableInput>,
) -> Response {
    if let Some(rejection) = state.gate(&headers) {
        return rejection;
    }
    table.name = table_name;
    let response = match state
        .catalog
        .update_table(&UpdateTableRequest::new(database, table))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    };
    state.finish(response)
}

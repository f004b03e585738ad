//! HTTP transport implementation.
//!
//! JSON REST API over the session registry and the experiment runner.

use std::collections::BTreeMap;
use std::future::Future;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rmcp::model::Tool;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::{Error, ExperimentServer};
use crate::domains::experiments::{
    DEFAULT_LIST_LIMIT, ExperimentError, ExperimentOutcome, ExperimentRecord, ExperimentRequest,
    ExperimentSummary,
};
use crate::domains::sessions::{ServerRegistration, SessionError};

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: ExperimentServer,
}

/// Body of `POST /servers`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterServerRequest {
    #[serde(alias = "url")]
    pub address: String,
}

/// Query of `GET /experiments`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListExperimentsQuery {
    pub limit: Option<usize>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Build the API router.
    pub fn router(&self, server: ExperimentServer) -> Router {
        let mut app = Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_check))
            .route("/servers", post(register_server).get(list_servers))
            .route("/servers/{id}/tools", get(list_tools))
            .route("/experiments", post(run_experiment).get(list_experiments))
            .route("/experiments/{id}", get(get_experiment))
            .with_state(AppState { server })
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Run the HTTP transport until `shutdown` resolves.
    pub async fn run<F>(self, server: ExperimentServer, shutdown: F) -> TransportResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.address();
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → Servers:     POST/GET /servers, GET /servers/{{id}}/tools");
        info!("  → Experiments: POST/GET /experiments, GET /experiments/{{id}}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| TransportError::serve(e.to_string()))?;

        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "max_iterations": state.server.runner().max_iterations(),
        "endpoints": {
            "servers": "/servers",
            "tools": "/servers/{id}/tools",
            "experiments": "/experiments",
            "experiment": "/experiments/{id}",
            "health": "/health"
        }
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[instrument(skip_all)]
async fn register_server(
    State(state): State<AppState>,
    Json(request): Json<RegisterServerRequest>,
) -> Result<Json<ServerRegistration>, Error> {
    let registration = state.server.registry().register(&request.address).await?;
    Ok(Json(registration))
}

async fn list_servers(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(state.server.registry().list_registrations().await)
}

#[instrument(skip(state))]
async fn list_tools(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Tool>>, Error> {
    let tools = state.server.registry().list_tools(&id).await?;
    Ok(Json(tools))
}

#[instrument(skip_all)]
async fn run_experiment(
    State(state): State<AppState>,
    Json(request): Json<ExperimentRequest>,
) -> Result<Response, Error> {
    let response = match state.server.runner().run(request).await? {
        ExperimentOutcome::Completed(record) => (StatusCode::OK, Json(record)).into_response(),
        ExperimentOutcome::Rejected(rejection) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(rejection)).into_response()
        }
    };
    Ok(response)
}

async fn list_experiments(
    State(state): State<AppState>,
    Query(query): Query<ListExperimentsQuery>,
) -> Result<Json<Vec<ExperimentSummary>>, Error> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.server.runner().list(limit).await?))
}

#[instrument(skip(state))]
async fn get_experiment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExperimentRecord>, Error> {
    Ok(Json(state.server.runner().get(&id).await?))
}

impl Error {
    /// Status code and machine-readable kind for an API error.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Session(SessionError::NotFound(_))
            | Error::Experiment(ExperimentError::NotFound(_))
            | Error::Experiment(ExperimentError::ServerNotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            Error::Session(SessionError::InvalidAddress(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation")
            }
            Error::Session(
                SessionError::Connection { .. }
                | SessionError::Discovery(_)
                | SessionError::Invocation(_)
                | SessionError::Closed,
            ) => (StatusCode::BAD_GATEWAY, "connection"),
            Error::Session(SessionError::Store(_))
            | Error::Experiment(ExperimentError::Store(_))
            | Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request refused: {}", self);
        }

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "kind": kind,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::core::store::SqliteStore;
    use crate::domains::sessions::testing::FakeConnector;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router(connector: FakeConnector) -> Router {
        let store = SqliteStore::open_in_memory().unwrap();
        let server = ExperimentServer::new(Config::default(), store, Arc::new(connector));
        HttpTransport::new(HttpConfig::default()).router(server)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, address: &str) -> String {
        let (status, body) = send(app, "POST", "/servers", Some(json!({ "url": address }))).await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_and_list_servers() {
        let app = test_router(FakeConnector::new());

        let (status, body) = send(
            &app,
            "POST",
            "/servers",
            Some(json!({ "address": "http://host:8001" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], "http://host:8001");
        let id = body["id"].as_str().unwrap().to_string();

        register(&app, "http://other:8001").await;

        let (status, servers) = send(&app, "GET", "/servers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(servers.as_object().unwrap().len(), 2);
        assert_eq!(servers[&id], "http://host:8001");
    }

    #[tokio::test]
    async fn test_register_unreachable_is_bad_gateway() {
        let app = test_router(FakeConnector::new().with_unreachable("http://down:1"));

        let (status, body) =
            send(&app, "POST", "/servers", Some(json!({ "address": "http://down:1" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "connection");
    }

    #[tokio::test]
    async fn test_list_tools() {
        let app = test_router(FakeConnector::new());
        let id = register(&app, "http://host:8001").await;

        let (status, tools) = send(&app, "GET", &format!("/servers/{id}/tools"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tools[0]["name"], "echo");

        let (status, body) = send(&app, "GET", "/servers/missing/tools", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_run_and_fetch_experiment() {
        let app = test_router(FakeConnector::new());
        let id = register(&app, "http://host:8001").await;

        let (status, record) = send(
            &app,
            "POST",
            "/experiments",
            Some(json!({
                "server_id": id,
                "tool": "echo",
                "arguments": { "message": "hello" },
                "iterations": 2
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["iterations"], 2);
        assert_eq!(record["error_count"], 0);
        assert_eq!(record["responses"][1]["content"][0]["text"], "Echo: hello");

        let experiment_id = record["id"].as_str().unwrap();
        let (status, fetched) =
            send(&app, "GET", &format!("/experiments/{experiment_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, record);

        let (status, listed) = send(&app, "GET", "/experiments?limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["id"], experiment_id);
    }

    #[tokio::test]
    async fn test_out_of_range_iterations_is_rejection_data() {
        let app = test_router(FakeConnector::new());
        let id = register(&app, "http://host:8001").await;

        let (status, body) = send(
            &app,
            "POST",
            "/experiments",
            Some(json!({
                "server_id": id,
                "tool": "echo",
                "arguments": {},
                "iterations": 101
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["max"], 100);
        assert_eq!(body["requested"], 101);

        let (_, listed) = send(&app, "GET", "/experiments", None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let app = test_router(FakeConnector::new());

        let (status, _) = send(
            &app,
            "POST",
            "/experiments",
            Some(json!({
                "server_id": "missing",
                "tool": "echo",
                "iterations": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/experiments/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_router(FakeConnector::new());
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}

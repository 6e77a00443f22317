//! HTTP API server for integration with other systems.
//!
//! Serves questions, health and status. The engine warms up in the
//! background; until it is ready, queries get 503.

use crate::cli::Output;
use crate::config::Settings;
use crate::service::{EngineState, RagService, StatusRecord};
use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    service: Arc<RagService>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let service = Arc::new(RagService::new(settings));

    let warm_up = service.clone();
    tokio::spawn(async move {
        info!("Warming up RAG engine...");
        if let Err(e) = warm_up.initialize().await {
            error!("RAG engine failed to start: {}", e);
        }
    });

    let app = router(Arc::new(AppState { service }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Preken API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Query", "POST /api/query");
    Output::kv("Health", "GET  /health");
    Output::kv("Status", "GET  /status");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/query", post(query))
        .route("/health", get(health))
        .route("/status", get(status))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Debug, Default, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    question: String,
}

/// Query body sent as JSON or as a urlencoded form.
///
/// A body that cannot be read yields an empty question, which the handler
/// rejects with 400.
struct QueryBody(QueryRequest);

impl<S: Send + Sync> FromRequest<S> for QueryBody {
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let parsed = if is_form {
            Form::<QueryRequest>::from_request(req, state)
                .await
                .map(|Form(body)| body)
                .ok()
        } else {
            Json::<QueryRequest>::from_request(req, state)
                .await
                .map(|Json(body)| body)
                .ok()
        };

        Ok(QueryBody(parsed.unwrap_or_default()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: String,
}

#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    status: StatusRecord,
    overall_status: &'static str,
}

/// Overall label and HTTP code for an engine state.
fn health_of(state: EngineState) -> (&'static str, StatusCode) {
    match state {
        EngineState::Ready => ("healthy", StatusCode::OK),
        EngineState::Failed => ("error", StatusCode::INTERNAL_SERVER_ERROR),
        EngineState::Uninitialized | EngineState::Initializing => {
            ("initializing", StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

// === Handlers ===

async fn query(
    State(state): State<Arc<AppState>>,
    QueryBody(req): QueryBody,
) -> impl IntoResponse {
    let question = req.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Question is required".to_string(),
            }),
        )
            .into_response();
    }

    match state.service.try_query(question).await {
        Ok(result) => Json(result).into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "RAG system is initializing. Please try again in a moment.".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine_state = state.service.state();
    let (label, code) = health_of(engine_state);
    let message = match engine_state {
        EngineState::Ready => "RAG system is ready".to_string(),
        EngineState::Failed => state
            .service
            .last_error()
            .unwrap_or_else(|| "RAG system failed to initialize".to_string()),
        _ => "RAG system is initializing".to_string(),
    };

    (
        code,
        Json(HealthResponse {
            status: label,
            message,
        }),
    )
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.service.get_status().await;
    let overall_status = match health_of(status.state).0 {
        "healthy" => "ready",
        other => other,
    };

    Json(StatusResponse {
        status,
        overall_status,
    })
}

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::AnalysisConfig;
use crate::db::Db;
use crate::state::SharedState;
use crate::trends::{analyze_node, TrendOutcome, TrendRequest};

#[derive(Clone)]
pub struct AppState {
    pub shared: SharedState,
    pub db: Db,
    pub analysis: AnalysisConfig,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

pub enum ApiError {
    NotFound(String),
    Unprocessable(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "api request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/nodes", get(api_nodes))
        .route("/api/trends/{node_id}", get(api_trends))
        .with_state(app)
}

async fn api_status(State(app): State<AppState>) -> impl IntoResponse {
    let st = app.shared.read().await;
    Json(st.to_status())
}

async fn api_nodes(State(app): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(app.db.list_nodes().await?))
}

#[derive(Debug, Default, Deserialize)]
struct TrendQuery {
    window: Option<usize>,
    from: Option<String>,
    to: Option<String>,
}

async fn api_trends(
    State(app): State<AppState>,
    Path(node_id): Path<String>,
    Query(q): Query<TrendQuery>,
) -> Result<Response, ApiError> {
    let request = TrendRequest::parse(q.window, q.from.as_deref(), q.to.as_deref())
        .map_err(|e| ApiError::Unprocessable(e.to_string()))?;

    match analyze_node(&app.db, &node_id, &app.analysis, &request).await? {
        TrendOutcome::NoData => Err(ApiError::NotFound(format!(
            "no readings stored for node '{node_id}'"
        ))),
        TrendOutcome::TooFewPoints { points, min_points } => Err(ApiError::Unprocessable(
            format!("{points} readings available, at least {min_points} needed"),
        )),
        TrendOutcome::Rejected(e) => Err(ApiError::Unprocessable(e.to_string())),
        TrendOutcome::Analysed(view) => Ok(Json(view).into_response()),
    }
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(app: AppState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind web port {port}"))?;

    tracing::info!(%addr, "web api listening");

    axum::serve(listener, router(app))
        .await
        .context("web server error")
}

// ===========================================================================
// Tests
// ===========================================================================

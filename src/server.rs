//! HTTP boundary: a thin JSON API over the shared state.
//!
//! The boundary never touches project status directly; it only issues
//! transition requests into the lifecycle state machine and reads through
//! the status projection. Routes:
//!
//! - `GET  /health`
//! - `GET  /projects`: ordered project summaries
//! - `POST /projects/reload`: on-demand registry reload (merge semantics)
//! - `GET  /projects/{id}`: derived view record
//! - `POST /projects/{id}/{action}`: request build / up / down

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use thiserror::Error;

use crate::fleet_config::FleetConfig;
use crate::lifecycle::{Action, ProjectSet, RequestOutcome};
use crate::registry;
use crate::runtime::RuntimeMirror;
use crate::view;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub config: FleetConfig,
    /// Shared with the scheduler task, which holds its own clone.
    pub projects: Arc<ProjectSet>,
    pub mirror: RuntimeMirror,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: FleetConfig) -> Self {
        let projects = Arc::new(ProjectSet::new(registry::load(&config.projects_dir)));
        let mirror = RuntimeMirror::new(config.runtime_socket.clone());
        Self {
            config,
            projects,
            mirror,
        }
    }
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Project {0} not found")]
    ProjectNotFound(String),

    #[error("Unknown action '{0}', expected build, up or down")]
    UnknownAction(String),

    #[error("Project {0} is mid-action, request ignored")]
    ActionInFlight(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnknownAction(_) => StatusCode::BAD_REQUEST,
            ApiError::ActionInFlight(_) => StatusCode::CONFLICT,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects))
        .route("/projects/reload", post(reload_projects))
        .route("/projects/{id}", get(get_project_view))
        .route("/projects/{id}/{action}", post(request_transition))
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

/// Ordered project summaries: id plus the immutable configuration fields
/// the boundary displays.
async fn list_projects(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.projects.all().await)
}

/// Re-scan the projects root and merge the result into the live set.
async fn reload_projects(State(state): State<SharedState>) -> impl IntoResponse {
    let projects = registry::load(&state.config.projects_dir);
    state.projects.reload(projects).await;
    Json(state.projects.ids().await)
}

async fn get_project_view(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<view::ProjectView>, ApiError> {
    view::project_view(&state.projects, &state.mirror, &id)
        .await
        .map(Json)
        .ok_or(ApiError::ProjectNotFound(id))
}

async fn request_transition(
    State(state): State<SharedState>,
    Path((id, action)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let action = Action::from_str(&action).map_err(|()| ApiError::UnknownAction(action))?;
    match state.projects.request(&id, action).await {
        RequestOutcome::Accepted => {
            tracing::info!(project = %id, %action, "transition requested");
            Ok(StatusCode::ACCEPTED)
        }
        RequestOutcome::InFlight => Err(ApiError::ActionInFlight(id)),
        RequestOutcome::UnknownProject => Err(ApiError::ProjectNotFound(id)),
    }
}

// ── Serving ───────────────────────────────────────────────────────────

/// Bind and serve the API until ctrl-c.
pub async fn serve(state: SharedState) -> Result<()> {
    let addr = format!("127.0.0.1:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, "listening");

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    export::{self, ExportError},
    pages,
    scanner::{DelayRange, ScanError, Scanner},
};

/// Runtime settings for the embedded web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub assets_dir: PathBuf,
    pub delay: DelayRange,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".into(),
            assets_dir: PathBuf::from("ui"),
            delay: DelayRange::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    scanner: Scanner,
}

impl AppState {
    pub fn new(scanner: Scanner) -> Self {
        Self { scanner }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub domain: Option<String>,
    /// Set by history sidebar links: restart even if the domain is scanning.
    #[serde(default)]
    pub rerun: Option<u8>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("no scan has been started")]
    NoScan,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Scan(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NoScan => StatusCode::CONFLICT,
        };
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the full application router around `state`.
pub fn router(state: AppState, assets_dir: impl Into<PathBuf>) -> Router {
    let api = Router::new()
        .route("/scan", post(post_scan))
        .route("/cancel", post(post_cancel))
        .route("/status", get(get_status))
        .route("/results", get(get_results))
        .route("/history", get(get_history))
        .route("/export.csv", get(export_csv))
        .route("/report", get(export_report))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/dashboard", get(dashboard))
        .nest("/api", api)
        .nest_service("/assets", ServeDir::new(assets_dir.into()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn spawn_server(config: ServerConfig) -> Result<()> {
    let state = AppState::new(Scanner::new(config.delay));
    let app = router(state, config.assets_dir.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %listener.local_addr()?, assets = %config.assets_dir.display(), "serving UI");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn home() -> Html<String> {
    Html(pages::render_home())
}

async fn about() -> Html<String> {
    Html(pages::render_about())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html("<h1>404</h1><p><a href=\"/\">Back to Home</a></p>"))
}

async fn dashboard(State(app): State<AppState>, Query(q): Query<DashboardQuery>) -> Html<String> {
    // A non-empty ?domain= kicks off a scan, unless that domain is already running.
    if let Some(domain) = q.domain.as_deref().filter(|d| !d.trim().is_empty()) {
        let started = if q.rerun.unwrap_or(0) != 0 {
            app.scanner.select_history(domain).await.map(Some)
        } else {
            app.scanner.start_unless_running(domain).await
        };
        if let Err(e) = started {
            warn!(error = %e, "ignoring dashboard scan request");
        }
    }
    let session = app.scanner.snapshot_for_render().await;
    Html(pages::render_dashboard(&session))
}

async fn post_scan(
    State(app): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    app.scanner.start(&req.domain).await?;
    Ok((StatusCode::ACCEPTED, Json(app.scanner.status().await)))
}

async fn post_cancel(State(app): State<AppState>) -> impl IntoResponse {
    app.scanner.cancel().await;
    Json(app.scanner.status().await)
}

async fn get_status(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.scanner.status().await)
}

async fn get_results(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.scanner.results().await)
}

async fn get_history(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.scanner.history().await)
}

async fn export_csv(State(app): State<AppState>) -> Result<Response, ApiError> {
    let session = app.scanner.snapshot().await;
    let domain = session.domain().ok_or(ApiError::NoScan)?;
    let body = export::to_csv(session.results())?;
    let disposition = export::content_disposition(&export::csv_filename(domain));
    info!(domain, rows = session.results().len(), "csv export");
    Ok(download(body, "text/csv; charset=utf-8", disposition))
}

async fn export_report(State(app): State<AppState>) -> Result<Response, ApiError> {
    let session = app.scanner.snapshot().await;
    let domain = session.domain().ok_or(ApiError::NoScan)?;
    let body = export::render_report(domain, session.results(), OffsetDateTime::now_utc());
    let disposition = export::content_disposition(&export::report_filename(domain));
    info!(domain, rows = session.results().len(), "report export");
    Ok(download(body, "text/html; charset=utf-8", disposition))
}

fn download(body: String, content_type: &str, disposition: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

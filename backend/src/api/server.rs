//! HTTP Server for the salesboard API.
//!
//! Serves dashboard payloads; drawing the charts is left to the client.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                                  |
//! |--------|-------------------|----------------------------------------------|
//! | GET    | `/health`         | Health check                                 |
//! | POST   | `/api/upload`     | Upload a CSV export, get the dashboard       |
//! | GET    | `/api/dashboard`  | Fetch the configured sheet, get the dashboard|
//! | GET    | `/api/logs`       | SSE stream for real-time logs                |
//!
//! `?records=true` on either dashboard route adds the cleaned rows.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, DashboardResponse};
use crate::config::{PipelineConfig, SourceConfig, MAX_UPLOAD_SIZE};
use crate::error::{PipelineError, ServerResult, SourceError};
use crate::source::GoogleSheetSource;
use crate::transform::pipeline::{run_bytes, run_source};

type ApiError = (StatusCode, Json<Value>);

/// Shared, read-only server configuration.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Sheet behind `GET /api/dashboard`; the route answers 503 without it.
    pub source: Option<SourceConfig>,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    records: bool,
}

/// Build the router (exposed for tests and embedding).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_csv))
        .route("/api/dashboard", get(sheet_dashboard))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn start_server(port: u16, state: AppState) -> ServerResult<()> {
    let has_sheet = state.source.is_some();
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 Salesboard server running on http://localhost:{}", port);
    eprintln!("   POST /api/upload    - Upload CSV export");
    eprintln!(
        "   GET  /api/dashboard - Dashboard from configured sheet{}",
        if has_sheet { "" } else { " (not configured)" }
    );
    eprintln!("   GET  /api/logs      - SSE log stream");
    eprintln!("   GET  /health        - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "salesboard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "dashboard": "GET /api/dashboard",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip missed entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload CSV endpoint
async fn upload_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
    mut multipart: Multipart,
) -> Result<Json<DashboardResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided"))?;
    log_info(format!(
        "📄 Upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let (info, run) = run_bytes(&bytes, &state.pipeline).map_err(pipeline_error)?;
    Ok(Json(DashboardResponse::new(info, &run, query.records)))
}

/// Dashboard for the configured sheet
async fn sheet_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let config = state.source.clone().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(error_response("No sheet configured")),
        )
    })?;

    let source = GoogleSheetSource::new(config);
    let (info, run) = run_source(&source, &state.pipeline)
        .await
        .map_err(pipeline_error)?;

    Ok(Json(DashboardResponse::new(info, &run, query.records)))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

/// Bad input is the client's fault, an unreachable sheet is a gateway failure.
fn pipeline_error(err: PipelineError) -> ApiError {
    log_error(format!("Pipeline failed: {}", err));

    let status = match &err {
        PipelineError::Source(SourceError::HttpError(_))
        | PipelineError::Source(SourceError::BadStatus { .. }) => StatusCode::BAD_GATEWAY,
        PipelineError::Source(SourceError::MissingConfig(_))
        | PipelineError::Source(SourceError::InvalidUrl(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(error_response(&err.to_string())))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swipr_core::domain::queue::{QueueItem, QueueMetadata, QueueSource, Sentiment};
use swipr_core::domain::stock::StockRecord;
use swipr_core::error::QueueError;
use swipr_core::queue::{IntegrityReport, QueueExport, QueueMetrics, QueueStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = swipr_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = AppState {
        queue: Arc::new(settings.open_queue()),
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/queue", get(get_queue).post(add_to_queue).delete(clear_queue))
        .route("/queue/batch", post(add_many_to_queue))
        .route("/queue/reorder", post(reorder_queue))
        .route("/queue/stocks", get(get_queue_stocks))
        .route("/queue/metrics", get(get_queue_metrics))
        .route("/queue/integrity", get(get_queue_integrity))
        .route("/queue/export", get(get_queue_export))
        .route(
            "/queue/:symbol",
            get(is_in_queue).delete(remove_from_queue),
        )
        .route("/resolve/:raw", get(resolve_symbol))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    queue: Arc<QueueStore>,
}

#[derive(Debug)]
enum ApiError {
    Queue(QueueError),
    Internal(anyhow::Error),
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        Self::Queue(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for(err: &QueueError) -> StatusCode {
    match err {
        QueueError::UnknownSymbol { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        QueueError::NotFound { .. } => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Queue(err) => {
                tracing::debug!(error = %err, "queue request rejected");
                (status_for(&err), err.to_string())
            }
            Self::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "queue request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Run a queue mutation on the blocking pool; saves may hit the filesystem
/// while the store lock is held.
async fn blocking<T, F>(queue: Arc<QueueStore>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&QueueStore) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&queue))
        .await
        .context("join queue task failed")
        .map_err(ApiError::Internal)
}

#[derive(Debug, Deserialize)]
struct AddRequest {
    symbol: String,
    #[serde(default)]
    source: Option<QueueSource>,
    #[serde(default)]
    sentiment: Option<Sentiment>,
}

#[derive(Debug, Deserialize)]
struct AddManyRequest {
    symbols: Vec<String>,
    #[serde(default)]
    source: Option<QueueSource>,
    #[serde(default)]
    sentiment: Option<Sentiment>,
}

#[derive(Debug, Serialize)]
struct AddManyResponse {
    inserted: usize,
    queue: Vec<QueueItem>,
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    symbols: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReorderResponse {
    changed: bool,
    queue: Vec<QueueItem>,
}

#[derive(Debug, Serialize)]
struct PresenceResponse {
    symbol: String,
    present: bool,
}

#[derive(Debug, Serialize)]
struct ResolveResponse {
    raw: String,
    canonical: String,
}

async fn get_queue(State(state): State<AppState>) -> Json<Vec<QueueItem>> {
    Json(state.queue.snapshot())
}

async fn add_to_queue(
    State(state): State<AppState>,
    Json(req): Json<AddRequest>,
) -> Result<Json<QueueItem>, ApiError> {
    let metadata = QueueMetadata {
        source: req.source,
        sentiment: req.sentiment,
    };
    let item = blocking(state.queue, move |q| q.add(&req.symbol, metadata)).await??;
    Ok(Json(item))
}

async fn add_many_to_queue(
    State(state): State<AppState>,
    Json(req): Json<AddManyRequest>,
) -> Result<Json<AddManyResponse>, ApiError> {
    let metadata = QueueMetadata {
        source: req.source,
        sentiment: req.sentiment,
    };
    let resp = blocking(state.queue, move |q| AddManyResponse {
        inserted: q.add_many(&req.symbols, metadata),
        queue: q.snapshot(),
    })
    .await?;
    Ok(Json(resp))
}

async fn remove_from_queue(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<StatusCode, ApiError> {
    blocking(state.queue, move |q| q.remove(&symbol)).await??;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_queue(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    blocking(state.queue, |q| q.clear()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn is_in_queue(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Json<PresenceResponse> {
    let present = state.queue.is_present(&symbol);
    Json(PresenceResponse { symbol, present })
}

async fn get_queue_stocks(State(state): State<AppState>) -> Json<Vec<StockRecord>> {
    Json(state.queue.stocks())
}

async fn get_queue_metrics(State(state): State<AppState>) -> Json<QueueMetrics> {
    Json(state.queue.metrics())
}

async fn get_queue_integrity(State(state): State<AppState>) -> Json<IntegrityReport> {
    Json(state.queue.validate_integrity())
}

async fn get_queue_export(State(state): State<AppState>) -> Json<QueueExport> {
    Json(state.queue.export())
}

async fn reorder_queue(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let resp = blocking(state.queue, move |q| ReorderResponse {
        changed: q.reorder(req.symbols.as_slice()),
        queue: q.snapshot(),
    })
    .await?;
    Ok(Json(resp))
}

async fn resolve_symbol(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let canonical = swipr_core::canonical::validate(state.queue.catalog(), &raw)?;
    Ok(Json(ResolveResponse {
        raw,
        canonical: canonical.to_string(),
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &swipr_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

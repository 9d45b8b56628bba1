//! HTTP endpoint server using Axum

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::aggregation::engine::BreakdownEngine;
use crate::config::Config;
use crate::error::FetchError;
use crate::keys::parser::{child_pattern, root_pattern, scope_pattern, SCOPE_DEPTH};
use crate::metrics::Metrics;
use crate::models::chart::{Breakdown, CategorySummary};
use crate::models::request::{BreakdownRequest, DrilldownRequest};
use crate::models::taxonomy::EntityKind;
use crate::models::time::{DateRange, Granularity};
use crate::services::cache::{CachedSeriesProvider, SystemClock};
use crate::services::comparison::{fetch_comparison, ComparisonData};
use crate::services::upstream::{SeriesProvider, SeriesQuery, TaggingApiClient};

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub engine: Arc<BreakdownEngine>,
    pub provider: Arc<dyn SeriesProvider>,
    pub fetch_timeout: Duration,
}

impl AppState {
    pub fn new(
        engine: BreakdownEngine,
        provider: Arc<dyn SeriesProvider>,
        fetch_timeout: Duration,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: Arc::new(Metrics::new()?),
            start_time: Arc::new(Instant::now()),
            engine: Arc::new(engine),
            provider,
            fetch_timeout,
        })
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Handler failure, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(FetchError),
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Upstream(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(err @ FetchError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
            ApiError::Upstream(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "tourlytics-api"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Increment in-flight requests
    state.metrics.http_requests_in_flight.inc();

    // Process request
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    // Decrement in-flight requests
    state.metrics.http_requests_in_flight.dec();

    // Record metrics
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    // Log if error status
    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

fn validate_range(range: &DateRange) -> Result<(), ApiError> {
    range.validate().map_err(ApiError::BadRequest)
}

/// Fetches both periods, counting attempts and failures.
async fn fetch_pair(state: &AppState, query: SeriesQuery) -> Result<ComparisonData, ApiError> {
    state.metrics.upstream_requests_total.inc();
    fetch_comparison(state.provider.as_ref(), &query, state.fetch_timeout)
        .await
        .map_err(|e| {
            let kind = match &e {
                FetchError::Timeout(_) => "timeout",
                FetchError::Http(_) => "http",
                FetchError::Transport(_) => "transport",
                FetchError::Decode(_) => "decode",
            };
            state
                .metrics
                .upstream_failures_total
                .with_label_values(&[kind])
                .inc();
            error!(error = %e, pattern = %query.pattern, "Upstream fetch failed");
            ApiError::from(e)
        })
}

fn record_breakdown(state: &AppState, breakdown: &Breakdown) {
    state
        .metrics
        .breakdowns_computed_total
        .with_label_values(&[breakdown.mode.as_str()])
        .inc();
    if let Some(others) = &breakdown.others {
        state
            .metrics
            .others_entries_total
            .inc_by(others.entries.len() as u64);
    }
}

/// First-level breakdown of a scope
async fn breakdown_handler(
    State(state): State<AppState>,
    payload: Result<Json<BreakdownRequest>, JsonRejection>,
) -> Result<Json<Breakdown>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_range(&request.range)?;

    let engine = &state.engine;
    let scope_id = engine.resolve_scope(request.kind, &request.scope);
    let scope_label = engine.label_for(request.kind, &scope_id);
    let pattern = scope_pattern(&engine.settings().root, &scope_label);

    let data = fetch_pair(
        &state,
        SeriesQuery::new(pattern, request.range, request.granularity),
    )
    .await?;

    let breakdown = engine.breakdown(&request, &data.current, &data.previous);
    record_breakdown(&state, &breakdown);
    Ok(Json(breakdown))
}

/// Second-level breakdown of one child inside a scope
async fn drilldown_handler(
    State(state): State<AppState>,
    payload: Result<Json<DrilldownRequest>, JsonRejection>,
) -> Result<Json<Breakdown>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_range(&request.breakdown.range)?;
    if request.child.trim().is_empty() {
        return Err(ApiError::BadRequest("child must not be empty".to_string()));
    }

    let engine = &state.engine;
    let base = &request.breakdown;
    let scope_id = engine.resolve_scope(base.kind, &base.scope);
    let child_id = engine.resolve_scope(EntityKind::Town, &request.child);
    let pattern = child_pattern(
        &engine.settings().root,
        &engine.label_for(base.kind, &scope_id),
        &engine.label_for(EntityKind::Town, &child_id),
    );

    let data = fetch_pair(&state, SeriesQuery::new(pattern, base.range, base.granularity)).await?;

    let breakdown = engine.drilldown(base, &request.child, &data.current, &data.previous);
    record_breakdown(&state, &breakdown);
    Ok(Json(breakdown))
}

#[derive(Debug, Deserialize)]
struct CategoriesQuery {
    start: String,
    end: String,
    #[serde(default)]
    granularity: Option<Granularity>,
    #[serde(default)]
    depth: Option<usize>,
}

/// Totals per taxonomy category
async fn categories_handler(
    State(state): State<AppState>,
    params: Result<Query<CategoriesQuery>, QueryRejection>,
) -> Result<Json<CategorySummary>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let range = DateRange::parse(&params.start, &params.end).ok_or_else(|| {
        ApiError::BadRequest("start and end must be YYYY-MM-DD dates".to_string())
    })?;
    validate_range(&range)?;

    let depth = params.depth.unwrap_or(SCOPE_DEPTH);
    if depth < SCOPE_DEPTH {
        warn!(depth, "Category depth below scope depth requested");
        return Err(ApiError::BadRequest(format!(
            "depth must be at least {}",
            SCOPE_DEPTH
        )));
    }

    let engine = &state.engine;
    let query = SeriesQuery::new(
        root_pattern(&engine.settings().root),
        range,
        params.granularity.unwrap_or(Granularity::Day),
    );
    let data = fetch_pair(&state, query).await?;

    Ok(Json(engine.summarize_categories(
        &data.current,
        &data.previous,
        depth,
    )))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/breakdown", post(breakdown_handler))
        .route("/api/breakdown/drilldown", post(drilldown_handler))
        .route("/api/categories", get(categories_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Wires the upstream client, cache and engine from `config`.
pub fn build_state(config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let client = TaggingApiClient::new(config.upstream_url.clone())
        .with_token(config.upstream_token.clone());
    let provider: Arc<dyn SeriesProvider> = Arc::new(CachedSeriesProvider::new(
        Arc::new(client),
        config.cache_ttl,
        config.cache_capacity,
        Arc::new(SystemClock),
    ));
    let engine = BreakdownEngine::new(config.taxonomy.clone(), config.engine_settings());

    Ok(AppState::new(engine, provider, config.fetch_timeout)?)
}

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config)?;
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "HTTP server listening on port {}", config.port);
    info!(upstream = %config.upstream_url, "Upstream tagging API");
    axum::serve(listener, app).await?;

    Ok(())
}

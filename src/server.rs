//! HTTP API over a shared [`PredictionService`].
//!
//! - `GET /` : liveness message
//! - `GET /health` : service status and loaded node counts
//! - `GET /predict/clusters/{year}` : per-country cluster assignments
//! - `GET /predict/trends/{country}?years_back=N` : cluster history
//! - `GET /cluster-stats/{year}/{cluster}` : statistics for one cluster
//!
//! Errors are returned as `{"detail": "..."}` with 400 for requests outside the
//! served domain, 404 for missing data and 500 for computation failures.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::{DinqError, ErrorKind};
use crate::request::{validate_cluster, validate_year};
use crate::schema::{ClusterId, ClusterStatsResponse, CountryTrendResponse, PredictionResponse};
use crate::service::PredictionService;

// ── Response types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub historical_nodes: usize,
    pub future_nodes: usize,
    pub features: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Deserialize)]
struct TrendsQuery {
    years_back: Option<u32>,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<DinqError> for ApiError {
    fn from(err: DinqError) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::ComputationFailure => {
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run a synchronous service call off the async executor.
async fn blocking<T, F>(service: &Arc<PredictionService>, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&PredictionService) -> Result<T, DinqError> + Send + 'static,
{
    let service = Arc::clone(service);
    match tokio::task::spawn_blocking(move || f(&service)).await {
        Ok(result) => result.map(Json).map_err(ApiError::from),
        Err(e) => {
            tracing::error!(error = %e, "prediction task aborted");
            Err(ApiError::internal(format!("prediction task aborted: {e}")))
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Digital Inequality Predictor API is running!".to_string(),
    })
}

async fn health(State(service): State<Arc<PredictionService>>) -> Json<HealthResponse> {
    let info = service.info();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: info.version.to_string(),
        historical_nodes: info.historical_nodes,
        future_nodes: info.future_nodes,
        features: info.features,
    })
}

async fn predict_clusters(
    State(service): State<Arc<PredictionService>>,
    Path(year): Path<i32>,
) -> ApiResult<PredictionResponse> {
    let year = validate_year(year, &service.config().server).map_err(DinqError::from)?;
    blocking(&service, move |s| {
        s.predict_clusters(year).map(|r| PredictionResponse::clone(&r))
    })
    .await
}

async fn country_trends(
    State(service): State<Arc<PredictionService>>,
    Path(country): Path<String>,
    Query(query): Query<TrendsQuery>,
) -> ApiResult<CountryTrendResponse> {
    let years_back = query
        .years_back
        .unwrap_or(service.config().server.default_years_back);
    blocking(&service, move |s| s.country_trends(&country, years_back)).await
}

async fn cluster_stats(
    State(service): State<Arc<PredictionService>>,
    Path((year, cluster)): Path<(i32, ClusterId)>,
) -> ApiResult<ClusterStatsResponse> {
    let server = &service.config().server;
    let year = validate_year(year, server).map_err(DinqError::from)?;
    let cluster = validate_cluster(cluster, server).map_err(DinqError::from)?;
    blocking(&service, move |s| s.cluster_stats(year, cluster)).await
}

// ── Router ────────────────────────────────────────────────────────────────

/// All routes, with permissive CORS, bound to `service`.
pub fn build_router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict/clusters/{year}", get(predict_clusters))
        .route("/predict/trends/{country}", get(country_trends))
        .route("/cluster-stats/{year}/{cluster}", get(cluster_stats))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

use actix_web::{web, HttpResponse, Responder};
use crate::config::HistorySettings;
use crate::core::QueryPipeline;
use crate::error::ApiError;
use crate::models::{AddressQuery, DistanceResponse, HealthResponse, HistoryQuery};
use crate::services::HistoryStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState<S> {
    pub pipeline: Arc<QueryPipeline<S>>,
    pub history: HistorySettings,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            history: self.history.clone(),
        }
    }
}

/// Configure all query-related routes
pub fn configure<S: HistoryStore>(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check::<S>))
        .route("/distance", web::post().to(calculate_distance::<S>))
        .route("/history", web::get().to(get_history::<S>));
}

/// Health check endpoint
async fn health_check<S: HistoryStore>(state: web::Data<AppState<S>>) -> impl Responder {
    let db_healthy = state.pipeline.store().health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Distance endpoint
///
/// POST /api/v1/distance
///
/// Request body:
/// ```json
/// {
///   "source": "Toronto, ON",
///   "destination": "Vancouver, BC",
///   "captchaToken": "string"
/// }
/// ```
async fn calculate_distance<S: HistoryStore>(
    state: web::Data<AppState<S>>,
    req: web::Json<AddressQuery>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state.pipeline.run(&req).await?;

    Ok(HttpResponse::Ok().json(DistanceResponse::new(outcome.distance, outcome.cleaned)))
}

/// Query history endpoint
///
/// GET /api/v1/history?limit={limit}
///
/// Newest first. `limit` defaults to 20; values above 100 are rejected.
async fn get_history<S: HistoryStore>(
    state: web::Data<AppState<S>>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = state.history.effective_limit(query.limit).ok_or_else(|| {
        ApiError::Validation(format!("limit must be at most {}", state.history.max_limit))
    })?;

    let records = state.pipeline.store().recent_queries(limit).await?;

    tracing::debug!("Returning {} history records (limit {})", records.len(), limit);

    Ok(HttpResponse::Ok().json(records))
}

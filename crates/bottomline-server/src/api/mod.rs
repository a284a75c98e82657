mod import;
mod import_runs;
mod notices;
mod ratings;
mod settings;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use bottomline_core::{ConfigStore, StoreError};
use bottomline_import::{ImportPipeline, ScheduleError, ScheduleReconciler};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{reconcile_schedule, request_id, require_bearer_auth, AuthState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<dyn ConfigStore>,
    pub pipeline: Arc<ImportPipeline>,
    pub reconciler: Arc<ScheduleReconciler>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn ok(request_id: String, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &bottomline_db::DbError) -> ApiError {
    if matches!(error, bottomline_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    tracing::error!(error = %error, "settings store failed");
    ApiError::new(request_id, "internal_error", "settings store failed")
}

pub(super) fn map_schedule_error(request_id: String, error: &ScheduleError) -> ApiError {
    tracing::error!(error = %error, "schedule update failed");
    ApiError::new(request_id, "internal_error", "schedule update failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, reconciler: Arc<ScheduleReconciler>) -> Router<AppState> {
    // Auth runs before reconcile so rejected requests never touch the schedule.
    Router::new()
        .route(
            "/api/v1/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/api/v1/import/now", post(import::import_now))
        .route("/api/v1/notices", get(notices::list_notices))
        .route("/api/v1/import-runs", get(import_runs::list_import_runs))
        .route(
            "/api/v1/ratings/{product_external_id}",
            get(ratings::get_rating),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    reconciler,
                    reconcile_schedule,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, Arc::clone(&state.reconciler)))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match bottomline_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;

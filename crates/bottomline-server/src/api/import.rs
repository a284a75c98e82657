use axum::{
    extract::{Query, State},
    Extension, Json,
};
use bottomline_core::settings::load_credentials;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::notices::Notice;
use super::{map_schedule_error, map_store_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ImportNowQuery {
    pub import_now: Option<bool>,
}

/// Starts an import in the background and answers immediately.
///
/// The recurring trigger is cleared and re-armed by the next reconcile.
pub(super) async fn import_now(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ImportNowQuery>,
) -> Result<Json<ApiResponse<Notice>>, ApiError> {
    if query.import_now != Some(true) {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "import_now=true is required",
        ));
    }

    let credentials = load_credentials(state.settings.as_ref())
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    if credentials.is_none() {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "Yotpo credentials are not configured",
        ));
    }
    if state.pipeline.is_running() {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "an import is already in progress",
        ));
    }

    state
        .reconciler
        .import_now()
        .await
        .map_err(|e| map_schedule_error(req_id.0.clone(), &e))?;
    tracing::info!(request_id = %req_id.0, "on-demand import requested");

    Ok(ApiResponse::ok(req_id.0, Notice::started()))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::super::test_support::{app_with, body_json, TestHarness};
    use crate::middleware::AuthState;

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn import_now_schedules_one_shot_and_reports_started() {
        let harness = TestHarness::with_credentials_and_frequency("1").await;
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(post("/api/v1/import/now?import_now=true"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(harness.registry.one_shots(), 1);
        // The reconcile middleware armed the cadence; the handler then cleared it.
        assert_eq!(harness.registry.armed(), None);
        assert_eq!(harness.registry.cancels(), 1);
        let json = body_json(response).await;
        assert_eq!(json["data"]["kind"], "started");
    }

    #[tokio::test]
    async fn import_now_requires_flag() {
        let harness = TestHarness::with_credentials_and_frequency("1").await;
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(post("/api/v1/import/now"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(harness.registry.one_shots(), 0);
    }

    #[tokio::test]
    async fn import_now_without_credentials_conflicts() {
        let harness = TestHarness::new();
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(post("/api/v1/import/now?import_now=true"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(harness.registry.one_shots(), 0);
    }

    #[tokio::test]
    async fn import_now_while_running_conflicts() {
        let harness = TestHarness::with_credentials_and_frequency("0").await;
        let _lease = harness.pipeline.try_lease().expect("lease");
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(post("/api/v1/import/now?import_now=true"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

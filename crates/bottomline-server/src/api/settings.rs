use axum::{extract::State, Extension, Json};
use bottomline_core::settings::{load_frequency, save_frequency};
use bottomline_core::{Cadence, Frequency, SettingKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_schedule_error, map_store_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct SettingsData {
    api_key: Option<String>,
    api_secret_set: bool,
    frequency: Frequency,
    frequency_code: u8,
    armed_cadence: Option<Cadence>,
    next_import_at: Option<DateTime<Utc>>,
}

/// Frequency as either its integer code or its name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum FrequencyInput {
    Code(i64),
    Name(String),
}

impl FrequencyInput {
    fn parse(&self) -> Result<Frequency, bottomline_core::CoreError> {
        match self {
            FrequencyInput::Code(code) => Frequency::from_code(*code),
            FrequencyInput::Name(name) => name.parse(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SettingsUpdate {
    api_key: Option<String>,
    api_secret: Option<String>,
    frequency: Option<FrequencyInput>,
}

async fn read_settings(state: &AppState, req_id: &str) -> Result<SettingsData, ApiError> {
    let store = state.settings.as_ref();
    let api_key = store
        .get(SettingKey::ApiKey)
        .await
        .map_err(|e| map_store_error(req_id.to_owned(), &e))?
        .filter(|v| !v.trim().is_empty());
    let api_secret_set = store
        .get(SettingKey::ApiSecret)
        .await
        .map_err(|e| map_store_error(req_id.to_owned(), &e))?
        .is_some_and(|v| !v.trim().is_empty());
    let frequency = load_frequency(store)
        .await
        .map_err(|e| map_store_error(req_id.to_owned(), &e))?;
    let status = state
        .reconciler
        .status()
        .await
        .map_err(|e| map_schedule_error(req_id.to_owned(), &e))?;

    Ok(SettingsData {
        api_key,
        api_secret_set,
        frequency,
        frequency_code: frequency.code(),
        armed_cadence: status.armed,
        next_import_at: status.next_fire_time,
    })
}

pub(super) async fn get_settings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SettingsData>>, ApiError> {
    let data = read_settings(&state, &req_id.0).await?;
    Ok(ApiResponse::ok(req_id.0, data))
}

/// Writes the supplied fields (trimmed), reconciles, and returns the result.
///
/// The frequency is validated before anything is written.
pub(super) async fn update_settings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ApiResponse<SettingsData>>, ApiError> {
    let frequency = update
        .frequency
        .as_ref()
        .map(FrequencyInput::parse)
        .transpose()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let store = state.settings.as_ref();
    for (key, value) in [
        (SettingKey::ApiKey, update.api_key.as_deref()),
        (SettingKey::ApiSecret, update.api_secret.as_deref()),
    ] {
        if let Some(value) = value {
            store
                .set(key, value.trim())
                .await
                .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
        }
    }
    if let Some(frequency) = frequency {
        save_frequency(store, frequency)
            .await
            .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    }
    tracing::info!(
        api_key_changed = update.api_key.is_some(),
        api_secret_changed = update.api_secret.is_some(),
        frequency = ?frequency,
        "settings updated"
    );

    state
        .reconciler
        .reconcile()
        .await
        .map_err(|e| map_schedule_error(req_id.0.clone(), &e))?;

    let data = read_settings(&state, &req_id.0).await?;
    Ok(ApiResponse::ok(req_id.0, data))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bottomline_core::Cadence;
    use tower::ServiceExt;

    use super::super::test_support::{app_with, body_json, TestHarness};
    use crate::middleware::AuthState;

    fn put_json(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri("/api/v1/settings")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn get_settings_hides_secret() {
        let harness = TestHarness::with_credentials_and_frequency("1").await;
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(
                Request::builder()
                    .uri("/api/v1/settings")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["api_key"], "app-1");
        assert_eq!(json["data"]["api_secret_set"], true);
        assert_eq!(json["data"]["frequency"], "daily");
        assert_eq!(json["data"]["armed_cadence"], "daily");
        assert!(!json.to_string().contains("s3cret"));
    }

    #[tokio::test]
    async fn put_settings_trims_and_arms() {
        let harness = TestHarness::new();
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(put_json(&serde_json::json!({
                "api_key": "  app-7 ",
                "api_secret": " tok ",
                "frequency": "twicedaily"
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            harness
                .settings
                .value(bottomline_core::SettingKey::ApiKey)
                .as_deref(),
            Some("app-7")
        );
        assert_eq!(harness.registry.armed(), Some(Cadence::TwiceDaily));
        let json = body_json(response).await;
        assert_eq!(json["data"]["frequency_code"], 2);
    }

    #[tokio::test]
    async fn put_frequency_without_credentials_is_forced_off() {
        let harness = TestHarness::new();
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(put_json(&serde_json::json!({ "frequency": 3 })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["frequency"], "off");
        assert_eq!(harness.registry.armed(), None);
    }

    #[tokio::test]
    async fn invalid_frequency_is_rejected_without_writes() {
        let harness = TestHarness::new();
        let response = app_with(&harness, AuthState::from_keys("", true).expect("auth"))
            .oneshot(put_json(&serde_json::json!({
                "api_key": "app-7",
                "frequency": "weekly"
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            harness.settings.value(bottomline_core::SettingKey::ApiKey),
            None
        );
    }
}

use axum::{extract::State, Extension, Json};
use bottomline_core::settings::{load_credentials, take_import_finished};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum NoticeKind {
    Started,
    InProgress,
    Completed,
    CredentialsNeeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum NoticeLevel {
    Info,
    Success,
    Warning,
}

/// A message for the admin UI.
#[derive(Debug, Serialize)]
pub(super) struct Notice {
    kind: NoticeKind,
    level: NoticeLevel,
    message: &'static str,
}

impl Notice {
    pub(super) fn started() -> Self {
        Self {
            kind: NoticeKind::Started,
            level: NoticeLevel::Info,
            message: "Yotpo import started. Ratings update in the background.",
        }
    }

    fn in_progress() -> Self {
        Self {
            kind: NoticeKind::InProgress,
            level: NoticeLevel::Info,
            message: "A Yotpo import is in progress.",
        }
    }

    fn completed() -> Self {
        Self {
            kind: NoticeKind::Completed,
            level: NoticeLevel::Success,
            message: "Yotpo import completed.",
        }
    }

    fn credentials_needed() -> Self {
        Self {
            kind: NoticeKind::CredentialsNeeded,
            level: NoticeLevel::Warning,
            message: "Set the Yotpo API key and secret to enable imports.",
        }
    }
}

/// Returns the current notices. The completion notice is shown once: reading
/// it clears the latch.
pub(super) async fn list_notices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Notice>>>, ApiError> {
    let store = state.settings.as_ref();
    let mut notices = Vec::new();

    if load_credentials(store)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .is_none()
    {
        notices.push(Notice::credentials_needed());
    }
    if state.pipeline.is_running() {
        notices.push(Notice::in_progress());
    }
    if take_import_finished(store)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
    {
        notices.push(Notice::completed());
    }

    Ok(ApiResponse::ok(req_id.0, notices))
}

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ImportRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImportRunItem {
    import_run_id: Uuid,
    trigger_source: String,
    status: String,
    pages_fetched: i32,
    records_merged: i64,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<bottomline_db::ImportRunRow> for ImportRunItem {
    fn from(row: bottomline_db::ImportRunRow) -> Self {
        Self {
            import_run_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            pages_fetched: row.pages_fetched,
            records_merged: row.records_merged,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

pub(super) async fn list_import_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ImportRunsQuery>,
) -> Result<Json<ApiResponse<Vec<ImportRunItem>>>, ApiError> {
    let rows = bottomline_db::list_import_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(ImportRunItem::from).collect();
    Ok(ApiResponse::ok(req_id.0, data))
}

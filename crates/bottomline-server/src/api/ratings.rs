use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct RatingItem {
    product_external_id: String,
    yotpo_product_score: Option<Decimal>,
    yotpo_total_reviews: Option<i32>,
    updated_at: DateTime<Utc>,
}

pub(super) async fn get_rating(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_external_id): Path<String>,
) -> Result<Json<ApiResponse<RatingItem>>, ApiError> {
    let row = bottomline_db::get_product_rating(&state.pool, &product_external_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(
        req_id.0,
        RatingItem {
            product_external_id: row.product_external_id,
            yotpo_product_score: row.yotpo_product_score,
            yotpo_total_reviews: row.yotpo_total_reviews,
            updated_at: row.updated_at,
        },
    ))
}

//! Database operations for `product_ratings`.
//!
//! Score and review count are upserted independently so either attribute
//! can be written without reading the other first.

use async_trait::async_trait;
use bottomline_core::{ProductStore, RatingAttribute, StoreError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `product_ratings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRatingRow {
    pub product_external_id: String,
    pub yotpo_product_score: Option<Decimal>,
    pub yotpo_total_reviews: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Overwrites the score of `product_external_id`, creating the row if needed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_product_score(
    pool: &PgPool,
    product_external_id: &str,
    score: Decimal,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO product_ratings (product_external_id, yotpo_product_score) \
         VALUES ($1, $2) \
         ON CONFLICT (product_external_id) DO UPDATE SET \
             yotpo_product_score = EXCLUDED.yotpo_product_score, \
             updated_at = NOW()",
    )
    .bind(product_external_id)
    .bind(score)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrites the review count of `product_external_id`, creating the row if
/// needed.
///
/// # Errors
///
/// Returns [`DbError::OutOfRange`] if `total_reviews` does not fit an
/// `INTEGER`, or [`DbError::Sqlx`] if the upsert fails.
pub async fn set_total_reviews(
    pool: &PgPool,
    product_external_id: &str,
    total_reviews: u32,
) -> Result<(), DbError> {
    let total_reviews = i32::try_from(total_reviews).map_err(|e| DbError::OutOfRange {
        field: "yotpo_total_reviews",
        reason: e.to_string(),
    })?;

    sqlx::query(
        "INSERT INTO product_ratings (product_external_id, yotpo_total_reviews) \
         VALUES ($1, $2) \
         ON CONFLICT (product_external_id) DO UPDATE SET \
             yotpo_total_reviews = EXCLUDED.yotpo_total_reviews, \
             updated_at = NOW()",
    )
    .bind(product_external_id)
    .bind(total_reviews)
    .execute(pool)
    .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the product has never been imported, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_product_rating(
    pool: &PgPool,
    product_external_id: &str,
) -> Result<ProductRatingRow, DbError> {
    sqlx::query_as::<_, ProductRatingRow>(
        "SELECT product_external_id, yotpo_product_score, yotpo_total_reviews, \
                created_at, updated_at \
         FROM product_ratings \
         WHERE product_external_id = $1",
    )
    .bind(product_external_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// [`ProductStore`] backed by the `product_ratings` table.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn set_attribute(
        &self,
        product_external_id: &str,
        attribute: RatingAttribute,
    ) -> Result<(), StoreError> {
        match attribute {
            RatingAttribute::ProductScore(score) => {
                set_product_score(&self.pool, product_external_id, score).await?;
            }
            RatingAttribute::TotalReviews(count) => {
                set_total_reviews(&self.pool, product_external_id, count).await?;
            }
        }
        Ok(())
    }
}

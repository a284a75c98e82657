//! Rating data as it moves from the provider into product storage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Number of bottomlines requested per provider page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Aggregate rating summary for one product, as reported by the provider.
///
/// Only `score` and `review_count` are persisted, keyed by
/// `product_external_id`; the record itself is transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottomlineRecord {
    pub product_external_id: String,
    pub score: Decimal,
    pub review_count: u32,
}

impl BottomlineRecord {
    /// The two attribute writes this record produces, in write order.
    #[must_use]
    pub fn attributes(&self) -> [RatingAttribute; 2] {
        [
            RatingAttribute::ProductScore(self.score),
            RatingAttribute::TotalReviews(self.review_count),
        ]
    }

    /// `true` when the provider key is usable as a product identifier.
    #[must_use]
    pub fn has_product_key(&self) -> bool {
        !self.product_external_id.trim().is_empty()
    }
}

/// A single stored product attribute together with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingAttribute {
    /// `yotpo_product_score`: average score, numeric.
    ProductScore(Decimal),
    /// `yotpo_total_reviews`: review count, integer.
    TotalReviews(u32),
}

impl RatingAttribute {
    /// Attribute name as exposed on the product record.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RatingAttribute::ProductScore(_) => "yotpo_product_score",
            RatingAttribute::TotalReviews(_) => "yotpo_total_reviews",
        }
    }
}

/// One page of provider results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingPage {
    pub requested_size: u32,
    pub records: Vec<BottomlineRecord>,
}

impl RatingPage {
    #[must_use]
    pub fn returned_size(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A page shorter than requested means the provider has no more data.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.returned_size() < self.requested_size as usize
    }
}

/// Position of the next page to fetch within a single import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportCursor {
    page_number: u32,
    page_size: u32,
}

impl ImportCursor {
    /// Creates a cursor at `page_number` (1-based).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCursor`] if either value is zero.
    pub fn new(page_number: u32, page_size: u32) -> Result<Self, CoreError> {
        if page_number == 0 {
            return Err(CoreError::InvalidCursor(
                "page numbers start at 1".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(CoreError::InvalidCursor(
                "page size must be positive".to_string(),
            ));
        }
        Ok(Self {
            page_number,
            page_size,
        })
    }

    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Moves to the next page.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCursor`] if the page number would overflow.
    pub fn advance(&mut self) -> Result<(), CoreError> {
        self.page_number = self
            .page_number
            .checked_add(1)
            .ok_or_else(|| CoreError::InvalidCursor("page number overflow".to_string()))?;
        Ok(())
    }
}

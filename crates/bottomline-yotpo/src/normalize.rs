//! Conversion of Yotpo wire types into domain rating pages.

use bottomline_core::{BottomlineRecord, RatingPage};

use crate::types::{BottomLinesEnvelope, WireBottomline};

impl From<WireBottomline> for BottomlineRecord {
    fn from(wire: WireBottomline) -> Self {
        BottomlineRecord {
            product_external_id: wire.domain_key.trim().to_string(),
            score: wire.product_score,
            review_count: wire.total_reviews,
        }
    }
}

/// Turns a parsed envelope into a [`RatingPage`], keeping provider order.
#[must_use]
pub fn normalize_page(envelope: BottomLinesEnvelope, requested_size: u32) -> RatingPage {
    RatingPage {
        requested_size,
        records: envelope
            .response
            .bottomlines
            .into_iter()
            .map(BottomlineRecord::from)
            .collect(),
    }
}

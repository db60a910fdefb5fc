//! Book records as they move through the pipeline and as they are stored.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod normalize;

pub use normalize::{capitalize_first, normalize, normalize_record, PRICE_MOJIBAKE};

/// A catalog entry: produced by the parser, cleaned by the normalizer, and used as
/// the write payload for both the pipeline and the Catalog API.
///
/// `title` is the natural key. Fields missing from the source markup are empty strings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, ToSchema)]
pub struct BookRecord {
    pub title: String,
    /// Display price, currency symbol included (e.g. `£51.77`). Never parsed to a number.
    pub price: String,
    pub availability: String,
}

impl BookRecord {
    pub fn new(
        title: impl Into<String>,
        price: impl Into<String>,
        availability: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            availability: availability.into(),
        }
    }
}

/// A persisted book: the record fields plus the store-assigned identifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct StoredBook {
    pub id: String,
    pub title: String,
    pub price: String,
    pub availability: String,
}

impl StoredBook {
    pub fn from_record(id: impl Into<String>, record: &BookRecord) -> Self {
        Self {
            id: id.into(),
            title: record.title.clone(),
            price: record.price.clone(),
            availability: record.availability.clone(),
        }
    }
}

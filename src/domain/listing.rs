use serde::{Deserialize, Serialize};

/// Value used for a text field that could not be found on the page.
pub const NOT_AVAILABLE: &str = "N/A";

/// Image stored when no usable source was found for a listing.
pub const NO_IMAGE_URL: &str = "https://via.placeholder.com/400x400?text=No+Image";

/// One scraped product card.
///
/// Every field is always populated; gaps are filled with [`NOT_AVAILABLE`],
/// an empty `price`, or [`NO_IMAGE_URL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: String,
    pub sale_price: String,
    pub price: String,
    pub image_url: String,
}

impl ListingRecord {
    /// Whether the image resolved to something other than the sentinel.
    pub fn has_image(&self) -> bool {
        self.image_url != NO_IMAGE_URL
    }
}

/// Structural fragments of the scraped page kept for downstream reuse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFragments {
    pub head: Option<String>,
    pub header: Option<String>,
}

impl PageFragments {
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.header.is_none()
    }
}

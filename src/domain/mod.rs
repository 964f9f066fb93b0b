pub mod article;
pub mod listing;

pub use article::NewsArticle;
pub use listing::{ListingRecord, PageFragments, NOT_AVAILABLE, NO_IMAGE_URL};

pub mod config;
pub mod core;
pub mod store;
pub mod utils;

pub use config::Configuration;
pub use crate::core::{ContentGenerator, RatingReviewExtractor, ExtractionError, ExtractionResult};
pub use store::{HotelStore, PropertyStore};

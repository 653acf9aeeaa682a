pub mod llm_client;
pub mod rating;
pub mod generator;

pub use llm_client::{LlmError, OllamaClient, PromptBuilder, TextGenerator};
pub use rating::{ExtractionError, ExtractionResult, RatingReview, RatingReviewExtractor};
pub use generator::{BatchCommand, ContentGenerator, RunReport};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Configuration;
use crate::core::llm_client::{PromptBuilder, TextGenerator};
use crate::core::rating::RatingReviewExtractor;
use crate::store::{Hotel, HotelStore, PropertyStore};
use crate::utils::{first_line, replace_hotel_name, strip_unwanted_prefixes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchCommand {
    /// Rewrite titles and descriptions into the application's property table.
    RewriteProperties,
    /// Rewrite names and descriptions in place in the trip `hotels` table.
    RewriteHotels,
    /// Generate summaries and rating/review pairs.
    GenerateInfo,
}

impl BatchCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchCommand::RewriteProperties => "rewrite-properties",
            BatchCommand::RewriteHotels => "rewrite-hotels",
            BatchCommand::GenerateInfo => "generate-info",
        }
    }
}

impl fmt::Display for BatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: String,
    pub command: BatchCommand,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub processing_time_seconds: f64,
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl RunReport {
    fn new(command: BatchCommand, model: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            command,
            model: model.to_string(),
            started_at: Utc::now(),
            processing_time_seconds: 0.0,
            processed: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    fn record(&mut self, hotel_id: i64, outcome: Result<Outcome>) {
        self.processed += 1;
        match outcome {
            Ok(Outcome::Updated(message)) => {
                info!("{}", message);
                self.updated += 1;
            }
            Ok(Outcome::Skipped(reason)) => {
                let message = format!("Skipping ID {} due to {}.", hotel_id, reason);
                warn!("{}", message);
                self.warnings.push(message);
                self.skipped += 1;
            }
            Err(e) => {
                let message = format!("Error processing ID {}: {:#}", hotel_id, e);
                error!("{}", message);
                self.errors.push(message);
                self.failed += 1;
            }
        }
    }
}

enum Outcome {
    Updated(String),
    Skipped(String),
}

pub struct ContentGenerator<G: TextGenerator> {
    generator: G,
    hotels: HotelStore,
    properties: PropertyStore,
    extractor: RatingReviewExtractor,
    unwanted_prefixes: Vec<String>,
    limit: Option<usize>,
    show_progress: bool,
}

impl<G: TextGenerator> ContentGenerator<G> {
    pub fn new(generator: G, hotels: HotelStore, properties: PropertyStore) -> Self {
        Self {
            generator,
            hotels,
            properties,
            extractor: RatingReviewExtractor::new(),
            unwanted_prefixes: Vec::new(),
            limit: None,
            show_progress: false,
        }
    }

    /// Apply batch, rating and title settings from the configuration.
    pub fn with_config(mut self, config: &Configuration) -> Self {
        self.extractor = RatingReviewExtractor::new().require_review(config.rating.require_review);
        self.unwanted_prefixes = config.title.unwanted_prefixes.clone();
        self.limit = config.batch.limit;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn hotels(&self) -> &HotelStore {
        &self.hotels
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub async fn run(&self, command: BatchCommand) -> Result<RunReport> {
        let start_time = Instant::now();
        let mut report = RunReport::new(command, self.generator.model());

        if command == BatchCommand::RewriteHotels {
            self.hotels
                .ensure_description_column()
                .context("Error ensuring 'description' column")?;
            info!("Verified or added 'description' column in the 'hotels' table");
        }

        let hotels = self.hotels
            .fetch_hotels(self.limit)
            .context("Failed to fetch hotels from the trip database")?;

        info!("Running {} over {} hotels", command, hotels.len());

        let progress = self.progress_bar(hotels.len() as u64)?;

        for hotel in &hotels {
            progress.set_message(hotel.hotel_name.clone());

            let outcome = match command {
                BatchCommand::RewriteProperties => self.rewrite_property(hotel).await,
                BatchCommand::RewriteHotels => self.rewrite_hotel(hotel).await,
                BatchCommand::GenerateInfo => self.generate_info(hotel).await,
            };
            report.record(hotel.hotel_id, outcome);

            progress.inc(1);
        }

        progress.finish_and_clear();
        report.processing_time_seconds = start_time.elapsed().as_secs_f64();

        info!(
            "{} completed: {} updated, {} skipped, {} failed in {:.2}s",
            command,
            report.updated,
            report.skipped,
            report.failed,
            report.processing_time_seconds
        );

        Ok(report)
    }

    fn progress_bar(&self, len: u64) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let bar = ProgressBar::new(len);
        bar.set_style(ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?);
        Ok(bar)
    }

    async fn rewrite_property(&self, hotel: &Hotel) -> Result<Outcome> {
        let Some(title) = self.generate_title(hotel).await else {
            return Ok(Outcome::Skipped("invalid rewritten title".to_string()));
        };

        let Some(description) = self
            .generate_text(
                "description",
                &PromptBuilder::property_description_prompt(hotel),
                PromptBuilder::property_description_system_prompt(),
            )
            .await
        else {
            return Ok(Outcome::Skipped("invalid description".to_string()));
        };

        let description = replace_hotel_name(&description, &hotel.hotel_name, &title);

        let Some(property) = self.properties.find_property_by_original_id(hotel.hotel_id)? else {
            return Ok(Outcome::Skipped(format!(
                "no existing record for Original ID {}",
                hotel.hotel_id
            )));
        };

        self.properties.update_property_content(property.id, &title, &description)?;

        Ok(Outcome::Updated(format!(
            "Updated: Original ID {}, Rewritten: {}, Description: {}",
            hotel.hotel_id, title, description
        )))
    }

    async fn rewrite_hotel(&self, hotel: &Hotel) -> Result<Outcome> {
        let title = self
            .generate_text(
                "title",
                &PromptBuilder::title_prompt(hotel),
                PromptBuilder::title_system_prompt(),
            )
            .await
            .map(|text| first_line(&text).to_string())
            .filter(|text| !text.is_empty());
        let Some(title) = title else {
            return Ok(Outcome::Skipped("invalid rewritten title".to_string()));
        };

        let description = self
            .generate_text(
                "description",
                &PromptBuilder::hotel_description_prompt(hotel, &title),
                PromptBuilder::hotel_description_system_prompt(),
            )
            .await
            .map(|text| first_line(&text).to_string())
            .filter(|text| !text.is_empty());
        let Some(description) = description else {
            return Ok(Outcome::Skipped("invalid description".to_string()));
        };

        self.hotels.update_hotel(hotel.hotel_id, &title, &description)?;

        Ok(Outcome::Updated(format!(
            "Updated: Original ID {}, Rewritten Title: {}, Description: {}",
            hotel.hotel_id, title, description
        )))
    }

    async fn generate_info(&self, hotel: &Hotel) -> Result<Outcome> {
        let Some(summary) = self
            .generate_text(
                "summary",
                &PromptBuilder::summary_prompt(hotel),
                PromptBuilder::summary_system_prompt(),
            )
            .await
        else {
            return Ok(Outcome::Skipped("invalid summary".to_string()));
        };

        self.properties.upsert_summary(hotel.hotel_id, &summary)?;

        let Some(text) = self
            .generate_text(
                "rating and review",
                &PromptBuilder::rating_review_prompt(hotel),
                PromptBuilder::rating_review_system_prompt(),
            )
            .await
        else {
            return Ok(Outcome::Skipped("invalid rating/review".to_string()));
        };

        let rating_review = match self.extractor.extract(&text) {
            Ok(rating_review) => rating_review,
            Err(e) => {
                warn!("Invalid rating/review format ({}): {}", e, text);
                return Ok(Outcome::Skipped("invalid rating/review".to_string()));
            }
        };

        // A zero rating is treated as no rating at all.
        if rating_review.rating == 0.0 {
            warn!("Zero rating in response: {}", text);
            return Ok(Outcome::Skipped("invalid rating/review".to_string()));
        }

        self.properties.upsert_rating_review(
            hotel.hotel_id,
            rating_review.rating,
            &rating_review.review,
        )?;

        Ok(Outcome::Updated(format!(
            "Property ID {} - Summary and Rating/Review generated and saved.",
            hotel.hotel_id
        )))
    }

    async fn generate_title(&self, hotel: &Hotel) -> Option<String> {
        let text = self
            .generate_text(
                "title",
                &PromptBuilder::title_prompt(hotel),
                PromptBuilder::title_system_prompt(),
            )
            .await?;

        let title = strip_unwanted_prefixes(&text, &self.unwanted_prefixes);
        (!title.is_empty()).then_some(title)
    }

    /// Generated text, or `None` when generation failed or came back empty.
    async fn generate_text(&self, what: &str, prompt: &str, system: &str) -> Option<String> {
        match self.generator.generate(prompt, system).await {
            Ok(response) => {
                debug!(
                    "Generated {} with {} in {:.2}s",
                    what,
                    response.model,
                    response.response_time.as_secs_f64()
                );
                let content = response.content.trim();
                (!content.is_empty()).then(|| content.to_string())
            }
            Err(e) => {
                error!("Error generating {}: {}", what, e);
                None
            }
        }
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::store::Hotel;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("cannot connect to Ollama at {0}")]
    Connection(String),

    #[error("Ollama API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("no 'response' field in API response")]
    MissingResponse,

    #[error("request error: {0}")]
    Http(String),

    #[error("JSON decode error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: &'a str,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Clone, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug)]
pub struct LlmResponse {
    /// Generated text with surrounding whitespace removed.
    pub content: String,
    pub model: String,
    pub response_time: Duration,
}

/// Anything that can turn a prompt and a system prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError>;

    fn model(&self) -> &str;
}

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// `timeout` is in seconds; 0 disables the request timeout.
    pub fn new(base_url: String, model: String, timeout: u64) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if timeout > 0 {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status: status.as_u16(), body });
        }

        let tags: TagsResponse = response.json().await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_connect() {
            LlmError::Connection(self.base_url.clone())
        } else {
            LlmError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let start_time = Instant::now();

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
        };

        debug!("Sending request to Ollama: {:?}", request);

        let url = format!("{}/api/generate", self.base_url);
        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status: status.as_u16(), body });
        }

        let body = response.text().await
            .map_err(|e| LlmError::Http(e.to_string()))?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = parsed.response.ok_or(LlmError::MissingResponse)?;

        Ok(LlmResponse {
            content: content.trim().to_string(),
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
            response_time: start_time.elapsed(),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Prompt and system prompt pairs for each kind of generated content.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn title_prompt(hotel: &Hotel) -> String {
        format!(
            "Change this hotel name into something new and unique:\n\
             Original hotel: {}\n\
             City: {}\n\
             Nearby Location: {}",
            hotel.hotel_name, hotel.city_name, hotel.position_name
        )
    }

    pub fn title_system_prompt() -> &'static str {
        "You are a hotel branding expert. Respond only with the new hotel name without any \
         extra descriptions or puzzle explanations. Do not include unrelated examples, \
         comparisons, or extra content."
    }

    /// Description for the property table, written about the original name.
    pub fn property_description_prompt(hotel: &Hotel) -> String {
        format!(
            "Write a concise, 20-word description for the hotel '{}' in {}, near {}.\n\
             Include key details like amenities, price, and location. Do not include \
             unrelated examples, comparisons, or extra content.",
            hotel.hotel_name, hotel.city_name, hotel.position_name
        )
    }

    pub fn property_description_system_prompt() -> &'static str {
        "You are a hotel description expert. Respond with a concise, 20-word description."
    }

    /// Description for the trip `hotels` table, written about the rewritten name.
    pub fn hotel_description_prompt(hotel: &Hotel, rewritten_title: &str) -> String {
        format!(
            "Write a concise, 20-word description for the hotel '{}' in {}, near {}.\n\
             Include key details like amenities, price, and location. Do not include any \
             additional explanations.",
            rewritten_title, hotel.city_name, hotel.position_name
        )
    }

    pub fn hotel_description_system_prompt() -> &'static str {
        "You are a hotel description expert. Respond only with the description text, \
         no additional explanations."
    }

    pub fn summary_prompt(hotel: &Hotel) -> String {
        format!(
            "Write a concise summary for the hotel '{}' located in {}.\n\
             Nearby Location: {}.\n\
             Room Type: {}, Price: {},\n\
             Latitude: {}, Longitude: {}.",
            hotel.hotel_name,
            hotel.city_name,
            hotel.position_name,
            or_na(hotel.room_type.as_deref()),
            or_na(hotel.price),
            or_na(hotel.latitude),
            or_na(hotel.longitude),
        )
    }

    pub fn summary_system_prompt() -> &'static str {
        "You are a hotel summary expert. Respond with a concise summary."
    }

    pub fn rating_review_prompt(hotel: &Hotel) -> String {
        format!(
            "Generate a rating and review 30-word for the hotel '{}' located in {}.\n\
             Nearby Location: {}. The review should be positive and professional. \
             Do not include unrelated examples, Question Answer or extra content.",
            hotel.hotel_name, hotel.city_name, hotel.position_name
        )
    }

    pub fn rating_review_system_prompt() -> &'static str {
        "You are a hotel review expert. Provide a rating and review."
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Result, Context};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub llm_settings: LlmSettings,
    pub databases: DatabaseSettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub rating: RatingSettings,
    #[serde(default)]
    pub title: TitleSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds; 0 waits indefinitely.
    #[serde(default)]
    pub timeout: u64,
}

/// Locations of the two SQLite databases the commands work against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Application database holding properties, summaries and reviews.
    pub default: String,
    /// Scraped hotel database holding the `hotels` table.
    pub trip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSettings {
    #[serde(default = "default_true")]
    pub require_review: bool,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self { require_review: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleSettings {
    #[serde(default = "default_unwanted_prefixes")]
    pub unwanted_prefixes: Vec<String>,
}

impl Default for TitleSettings {
    fn default() -> Self {
        Self { unwanted_prefixes: default_unwanted_prefixes() }
    }
}

fn default_version() -> String { "1.0".to_string() }
fn default_base_url() -> String { "http://ollama:11434".to_string() }
fn default_model() -> String { "phi".to_string() }
fn default_true() -> bool { true }

fn default_unwanted_prefixes() -> Vec<String> {
    vec![
        "New hotel name:".to_string(),
        "TITLE:".to_string(),
        "Rewritten:".to_string(),
    ]
}

impl Configuration {
    /// Load configuration from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        };

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.llm_settings.base_url.trim().is_empty() {
            anyhow::bail!("No base URL defined for the LLM server");
        }

        if self.llm_settings.model.trim().is_empty() {
            anyhow::bail!("No model defined in llm_settings");
        }

        if self.databases.default.is_empty() {
            anyhow::bail!("No path defined for the default database");
        }

        if self.databases.trip.is_empty() {
            anyhow::bail!("No path defined for the trip database");
        }

        if self.batch.limit == Some(0) {
            anyhow::bail!("Batch limit must be greater than zero");
        }

        Ok(())
    }

    /// Create an example configuration
    pub fn example() -> Self {
        Configuration {
            name: "Hotel content generation".to_string(),
            description: "Rewrite hotel titles and generate summaries, ratings and reviews".to_string(),
            version: default_version(),
            llm_settings: LlmSettings {
                base_url: default_base_url(),
                model: default_model(),
                timeout: 0,
            },
            databases: DatabaseSettings {
                default: "db.sqlite3".to_string(),
                trip: "trip.sqlite3".to_string(),
            },
            batch: BatchSettings { limit: Some(2) },
            rating: RatingSettings::default(),
            title: TitleSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_example_config_is_valid() {
        let config = Configuration::example();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm_settings.model, "phi");
        assert_eq!(config.batch.limit, Some(2));
    }

    #[test]
    fn test_load_yaml_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "name: test\nllm_settings: {{}}\ndatabases:\n  default: a.db\n  trip: b.db\n"
        ).unwrap();

        let config = Configuration::from_file(file.path()).unwrap();
        assert_eq!(config.llm_settings.base_url, "http://ollama:11434");
        assert_eq!(config.llm_settings.timeout, 0);
        assert!(config.rating.require_review);
        assert_eq!(config.title.unwanted_prefixes.len(), 3);
        assert_eq!(config.batch.limit, None);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let content = serde_json::to_string(&Configuration::example()).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let config = Configuration::from_file(file.path()).unwrap();
        assert_eq!(config.databases.trip, "trip.sqlite3");
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let mut config = Configuration::example();
        config.batch.limit = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Configuration::example();
        config.llm_settings.model = " ".to_string();
        assert!(config.validate().is_err());
    }
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, warn};

use hotel_content_generator::{
    config::Configuration,
    core::{BatchCommand, ContentGenerator, OllamaClient, RatingReviewExtractor, RunReport},
    store::{HotelStore, PropertyStore},
};

#[derive(Parser)]
#[command(
    name = "hotel_content_generator",
    about = "Rewrite hotel titles and generate summaries, ratings and reviews using an Ollama LLM",
    long_about = None,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite hotel titles and descriptions into the property table
    RewriteProperties(BatchArgs),

    /// Rewrite hotel names and descriptions in the trip hotels table
    RewriteHotels(BatchArgs),

    /// Generate a summary, rating and review for each hotel
    GenerateInfo(BatchArgs),

    /// Extract a rating and review from a model response
    ParseRating {
        /// Response text (read from stdin when omitted)
        #[arg(short, long)]
        text: Option<String>,

        /// Treat a rating without review text as a failure
        #[arg(long)]
        strict: bool,
    },

    /// List stored records
    List {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,

        /// What to list
        #[arg(value_enum)]
        kind: ListKind,

        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Only hotels in this city
        #[arg(long)]
        city: Option<String>,
    },

    /// Check Ollama server status
    CheckServer {
        /// Ollama server URL
        #[arg(long, env = "OLLAMA_URL", default_value = "http://ollama:11434")]
        server_url: String,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate example configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration format (yaml or json)
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}

#[derive(Args)]
struct BatchArgs {
    /// Configuration file path
    #[arg(short, long)]
    config: PathBuf,

    /// Ollama server URL (overrides config)
    #[arg(long, env = "OLLAMA_URL")]
    server_url: Option<String>,

    /// Model to use (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Maximum number of hotels to process (overrides config)
    #[arg(long)]
    limit: Option<usize>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ListKind {
    Summaries,
    Ratings,
    Hotels,
}

#[derive(clap::ValueEnum, Clone)]
enum ConfigFormat {
    Yaml,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::RewriteProperties(args) => batch_command(BatchCommand::RewriteProperties, args).await,
        Commands::RewriteHotels(args) => batch_command(BatchCommand::RewriteHotels, args).await,
        Commands::GenerateInfo(args) => batch_command(BatchCommand::GenerateInfo, args).await,
        Commands::ParseRating { text, strict } => parse_rating_command(text, strict),
        Commands::List { config, kind, search, city } => list_command(config, kind, search, city),
        Commands::CheckServer { server_url } => check_server_command(server_url).await,
        Commands::Validate { config } => validate_command(config),
        Commands::GenerateConfig { output, format } => generate_config_command(output, format).await,
    }
}

async fn batch_command(command: BatchCommand, args: BatchArgs) -> Result<()> {
    println!("{}", format!(" Starting {}...", command).bright_blue().bold());

    // Load configuration
    let mut config = Configuration::from_file(&args.config)?;

    // Override settings if provided
    if let Some(server_url) = args.server_url {
        config.llm_settings.base_url = server_url;
    }
    if let Some(model) = args.model {
        config.llm_settings.model = model;
    }
    if args.limit.is_some() {
        config.batch.limit = args.limit;
    }
    config.validate()?;

    println!(" Configuration: {}", config.name.bright_green());
    println!(" Model: {}", config.llm_settings.model);
    match config.batch.limit {
        Some(limit) => println!(" Limit: {} hotels", limit),
        None => println!(" Limit: all hotels"),
    }

    let llm_client = OllamaClient::new(
        config.llm_settings.base_url.clone(),
        config.llm_settings.model.clone(),
        config.llm_settings.timeout,
    )?;

    if !llm_client.check_health().await {
        error!(" Ollama server is not responding at {}", config.llm_settings.base_url);
        return Err(anyhow::anyhow!("Ollama server health check failed"));
    }

    println!(" Ollama server is healthy");

    let hotels = HotelStore::open(&config.databases.trip)?;
    let properties = PropertyStore::open(&config.databases.default)?;

    let generator = ContentGenerator::new(llm_client, hotels, properties)
        .with_config(&config)
        .with_progress(!args.quiet);

    let report = generator.run(command).await?;

    if let Some(report_path) = &args.report {
        tokio::fs::write(report_path, serde_json::to_string_pretty(&report)?).await?;
        println!(" Report written to: {}", report_path.display().to_string().bright_green());
    }

    print_report(&report);

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n{}", format!(" {} Summary", report.command).bright_green().bold());
    println!(" Processed: {}", report.processed.to_string().bright_cyan());
    println!(" Updated: {}", report.updated.to_string().bright_green());
    println!(" Skipped: {}", report.skipped.to_string().bright_yellow());
    println!(" Failed: {}", report.failed.to_string().bright_red());
    println!(" Total processing time: {:.2}s", report.processing_time_seconds);

    for message in &report.warnings {
        println!("  {}", message.yellow());
    }
    for message in &report.errors {
        println!("  {}", message.red());
    }

    if report.has_errors() {
        println!(" {} completed with some errors", report.command.to_string().bright_yellow());
    } else {
        println!(" {} completed successfully!", report.command.to_string().bright_green());
    }
}

fn parse_rating_command(text: Option<String>, strict: bool) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let extractor = RatingReviewExtractor::new().require_review(strict);
    match extractor.extract(text.trim()) {
        Ok(result) => {
            println!(" Rating: {}", result.rating.to_string().bright_cyan());
            println!(" Review: {}", result.review);
            Ok(())
        }
        Err(e) => {
            warn!(" Invalid rating/review format: {}", text.trim());
            Err(e.into())
        }
    }
}

fn list_command(
    config_path: PathBuf,
    kind: ListKind,
    search: Option<String>,
    city: Option<String>,
) -> Result<()> {
    let config = Configuration::from_file(&config_path)?;
    config.validate()?;

    let search = search.as_deref();

    match kind {
        ListKind::Summaries => {
            let store = PropertyStore::open(&config.databases.default)?;
            let summaries = store.search_summaries(search)?;
            println!("{}", format!(" {} summaries", summaries.len()).bright_blue().bold());
            for summary in summaries {
                println!("{} | {}", summary.property_id.to_string().bright_cyan(), summary.summary);
            }
        }
        ListKind::Ratings => {
            let store = PropertyStore::open(&config.databases.default)?;
            let reviews = store.search_rating_reviews(search)?;
            println!("{}", format!(" {} ratings", reviews.len()).bright_blue().bold());
            for review in reviews {
                println!(
                    "{} | {} | {}",
                    review.property_id.to_string().bright_cyan(),
                    review.rating.to_string().bright_green(),
                    review.review
                );
            }
        }
        ListKind::Hotels => {
            let store = HotelStore::open(&config.databases.trip)?;
            let hotels = store.search_hotels(search, city.as_deref())?;
            println!("{}", format!(" {} hotels", hotels.len()).bright_blue().bold());
            for hotel in hotels {
                println!(
                    "{} | {} | {} | {} | {} | {}",
                    hotel.hotel_id.to_string().bright_cyan(),
                    hotel.hotel_name,
                    hotel.city_name,
                    hotel.position_name,
                    hotel.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
                    hotel.description.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

async fn check_server_command(server_url: String) -> Result<()> {
    println!("{}", " Checking Ollama server...".bright_blue().bold());

    let client = OllamaClient::new(server_url.clone(), "phi".to_string(), 30)?;

    if client.check_health().await {
        println!(" Server is healthy at {}", server_url.bright_green());
    } else {
        println!(" Server is not responding at {}", server_url.bright_red());
        return Ok(());
    }

    // List models
    match client.list_models().await {
        Ok(models) => {
            println!(" Available models:");
            for model in models {
                println!("  - {}", model.bright_cyan());
            }
        }
        Err(e) => {
            warn!(" Could not list models: {}", e);
        }
    }

    Ok(())
}

fn validate_command(config_path: PathBuf) -> Result<()> {
    println!("{}", " Validating configuration...".bright_blue().bold());

    match Configuration::from_file(&config_path) {
        Ok(config) => {
            match config.validate() {
                Ok(()) => {
                    println!(" Configuration is valid!");
                    println!(" Name: {}", config.name.bright_green());
                    println!(" Version: {}", config.version);
                    println!(" Server: {}", config.llm_settings.base_url);
                    println!(" Model: {}", config.llm_settings.model);
                    println!(" Default database: {}", config.databases.default);
                    println!(" Trip database: {}", config.databases.trip);
                    Ok(())
                }
                Err(e) => {
                    error!(" Configuration validation failed: {}", e);
                    Err(e)
                }
            }
        }
        Err(e) => {
            error!(" Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

async fn generate_config_command(output_path: PathBuf, format: ConfigFormat) -> Result<()> {
    println!("{}", " Generating example configuration...".bright_blue().bold());

    let config = Configuration::example();

    let content = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(&config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
    };

    tokio::fs::write(&output_path, content).await?;

    println!(" Example configuration generated at: {}", output_path.display().to_string().bright_green());
    println!(" Edit the file to customize the server and database paths");

    Ok(())
}

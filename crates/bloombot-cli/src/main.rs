mod photo;
mod tui;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bloombot_core::config::{global_config_path, BloomConfig};
use bloombot_core::model::{care_badge, Conversation, Difficulty, PlantIdentification};
use bloombot_core::schema::response_schema;
use bloombot_core::{
    stream_into, BloomError, ChatSession, ChatSettings, GeminiBackend, IdentifySettings,
    PlantIdentifier,
};
use clap::Parser;
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,bloombot_core=info,bloombot=info";

#[derive(Parser)]
#[command(
    name = "bloombot",
    about = "BloomBot: identify plants from photos and chat with a gardening expert",
    version
)]
enum Cli {
    /// Identify the plant in a photo and print its care card
    Identify {
        /// Path to the photo
        path: PathBuf,
        /// Media type of the photo (default: guessed from the extension)
        #[arg(long)]
        mime: Option<String>,
        /// Output raw JSON instead of a care card
        #[arg(long)]
        json: bool,
        /// Include the photo as a data URI in JSON output
        #[arg(long)]
        with_image: bool,
    },
    /// Chat with the gardening expert (type /quit to leave)
    Chat,
    /// Launch the interactive terminal UI
    Tui,
    /// Print the identification response schema
    Schema,
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli, Cli::Tui) {
        init_file_logging()?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let project_dir = std::env::current_dir().context("failed to read current directory")?;
    let (config, warnings) =
        BloomConfig::load_with_warnings(Some(&project_dir)).context("failed to load config")?;

    run(cli, &config, &warnings).await
}

async fn run(cli: Cli, config: &BloomConfig, warnings: &[String]) -> Result<()> {
    match cli {
        Cli::Identify {
            path,
            mime,
            json,
            with_image,
        } => {
            let backend = make_backend(config)?;
            cmd_identify(backend, config, &path, mime.as_deref(), json, with_image).await
        }
        Cli::Chat => {
            let backend = make_backend(config)?;
            cmd_chat(backend, config).await
        }
        Cli::Tui => {
            let backend = make_backend(config)?;
            tui::run_tui(config, backend).await
        }
        Cli::Schema => cmd_schema(),
        Cli::Config => cmd_config(config, warnings),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// The TUI owns the terminal, so logs go to `~/.cache/bloombot/tui.log`.
fn init_file_logging() -> Result<()> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("bloombot");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let path = dir.join("tui.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn make_backend(config: &BloomConfig) -> Result<Arc<GeminiBackend>> {
    let api_key = config.gemini.resolve_api_key().with_context(|| {
        let path = global_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/bloombot/config.toml".into());
        format!("no Gemini API key configured (see {path})")
    })?;
    Ok(Arc::new(GeminiBackend::new(api_key, &config.gemini)))
}

async fn cmd_identify(
    backend: Arc<GeminiBackend>,
    config: &BloomConfig,
    path: &Path,
    mime: Option<&str>,
    json: bool,
    with_image: bool,
) -> Result<()> {
    let photo = photo::load(path, mime, &config.identify.default_mime_type).await?;
    let identifier = PlantIdentifier::new(backend, IdentifySettings::from_config(config));

    let plant = match identifier.identify(&photo.bytes, &photo.mime_type).await {
        Ok(plant) => plant,
        Err(e) => {
            eprintln!("{}", e.user_message().red());
            return Err(e).with_context(|| format!("failed to identify {}", photo.path.display()));
        }
    };

    if json {
        let out = if with_image {
            plant
        } else {
            plant.without_image()
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_care_card(&plant);
    Ok(())
}

fn print_care_card(plant: &PlantIdentification) {
    let difficulty = match plant.difficulty {
        Difficulty::Easy => plant.difficulty.green().to_string(),
        Difficulty::Moderate => plant.difficulty.yellow().to_string(),
        Difficulty::Challenging => plant.difficulty.red().to_string(),
    };

    // Header
    println!(
        "{} {}",
        plant.common_name.bold().green(),
        format!("({})", plant.scientific_name).italic()
    );
    println!(
        "{} {} {}",
        difficulty,
        format!("origin: {}", plant.origin.as_deref().unwrap_or("unknown")).dimmed(),
        plant.short_id().cyan()
    );
    println!();

    println!("{}", plant.description);
    println!();

    println!("{}", "--- Care Guide ---".dimmed());
    let rows = [
        ("Watering:", &plant.care.watering),
        ("Sunlight:", &plant.care.sunlight),
        ("Soil:", &plant.care.soil),
        ("Fertilizer:", &plant.care.fertilizer),
        ("Toxicity:", &plant.care.toxicity),
    ];
    for (label, value) in rows {
        println!("  {:<12} {}", label.dimmed(), value);
    }
    println!();
    println!(
        "  {} {}  {} {}",
        "water".dimmed(),
        care_badge(&plant.care.watering).blue(),
        "light".dimmed(),
        care_badge(&plant.care.sunlight).yellow()
    );
}

async fn cmd_chat(backend: Arc<GeminiBackend>, config: &BloomConfig) -> Result<()> {
    let session = ChatSession::create(
        backend,
        config.chat.system_instruction.clone(),
        ChatSettings::from_config(&config.chat),
    );
    let mut conversation = Conversation::with_greeting(&config.chat.greeting);
    let fallback = &config.chat.fallback_message;

    if let Some(greeting) = conversation.turns().first() {
        println!("{} {}", "bloombot>".green().bold(), greeting.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            println!();
            break;
        };
        let text = line.trim();
        if text == "/quit" {
            break;
        }
        if text.is_empty() {
            continue;
        }

        conversation.push_user(text)?;
        let stream = match session.send(text).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!(error = %e, "chat send failed");
                let message = close_failed_reply(&mut conversation, &e, fallback);
                println!("{} {}", "bloombot>".green().bold(), message.red());
                continue;
            }
        };

        print!("{} ", "bloombot>".green().bold());
        let mut printed = 0;
        let result = stream_into(&mut conversation, stream, fallback, |turn| {
            print!("{}", &turn.text[printed..]);
            printed = turn.text.len();
            let _ = std::io::stdout().flush();
        })
        .await;
        println!();

        if result.is_err() {
            println!("{} {}", "bloombot>".green().bold(), fallback.red());
        }
    }

    Ok(())
}

/// Close the pending exchange after `send` failed to open a reply and return
/// the text to show in its place.
fn close_failed_reply(
    conversation: &mut Conversation,
    err: &BloomError,
    fallback: &str,
) -> String {
    let message = err.chat_user_message(fallback);
    if conversation.begin_reply().is_ok() {
        conversation.interrupt_reply(&message);
    }
    message
}

fn cmd_schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&response_schema())?);
    Ok(())
}

fn cmd_config(config: &BloomConfig, warnings: &[String]) -> Result<()> {
    print!("{}", config.to_toml_redacted()?);
    if !warnings.is_empty() {
        eprintln!();
        for warning in warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }
    }
    Ok(())
}

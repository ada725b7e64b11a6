//! Command-line interface for minerva.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input, Select};
use indicatif::ProgressBar;
use minerva_chat::{ChatClient, ExportError, SendError};
use minerva_core::config::{Config, ConfigLoader};
use minerva_core::logging::init_logging;
use minerva_core::session::{SessionPatch, SessionStore};
use minerva_core::utils::{ensure_dir, expand_tilde, safe_filename, truncate};
use minerva_providers::{ChatBackend, HttpBackend, Provider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod tui;

#[derive(Parser)]
#[command(name = "minerva")]
#[command(about = "Multi-session research chat for the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up credentials, provider and relay URL
    Onboard,
    /// Open the interactive chat screen
    Chat {
        /// Resume an existing session by id
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Send one message and print the reply
    Send {
        /// The message to send
        message: String,
        /// Continue an existing session instead of starting a new one
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Export a conversation as a PDF report
    Export {
        /// Session id (defaults to the most recent session)
        #[arg(short, long)]
        session: Option<String>,
        /// Report title (defaults to the session title)
        #[arg(short, long)]
        title: Option<String>,
        /// Output file (defaults to <title>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show configuration and relay status
    Status,
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions, newest first
    List,
    /// Delete one session
    Delete {
        /// Session id
        id: String,
    },
    /// Delete all chat history
    Clear,
    /// Rename a session
    Rename {
        /// Session id
        id: String,
        /// New title
        title: String,
    },
    /// Add or remove a tag on a session
    Tag {
        /// Session id
        id: String,
        /// Tag to add
        #[arg(short, long)]
        add: Option<String>,
        /// Tag to remove
        #[arg(short, long)]
        remove: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };

    match cli.command {
        Commands::Onboard => {
            run_onboard(&loader)?;
        }
        Commands::Chat { session } => {
            let config = loader.load()?;
            // The chat screen owns the terminal, so logs go to the file only.
            let _guard = init_logging(&config.logging, false);
            info!("Opening chat screen");
            tui::run_chat(&config, session).await?;
        }
        Commands::Send { message, session } => {
            let config = loader.load()?;
            let _guard = init_logging(&config.logging, true);
            info!("Sending one-shot message");
            run_send(&config, message, session).await?;
        }
        Commands::Sessions { command } => {
            let config = loader.load()?;
            let _guard = init_logging(&config.logging, true);
            run_sessions(&config, command)?;
        }
        Commands::Export {
            session,
            title,
            output,
        } => {
            let config = loader.load()?;
            let _guard = init_logging(&config.logging, true);
            info!("Exporting conversation");
            run_export(&config, session, title, output).await?;
        }
        Commands::Status => {
            let config = loader.load()?;
            let _guard = init_logging(&config.logging, true);
            info!("Showing status");
            run_status(&loader, &config).await?;
        }
    }

    Ok(())
}

fn resolve_provider(config: &Config) -> Result<Provider> {
    Provider::from_name(&config.chat.provider).ok_or_else(|| {
        anyhow::anyhow!(
            "No provider found for key: {} (known: openai, deepseek, moonshot, qwen)",
            config.chat.provider
        )
    })
}

fn open_store(config: &Config) -> SessionStore {
    SessionStore::open(config.storage.sessions_path())
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn format_timestamp(ms: i64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_millis_opt(ms) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => "-".to_string(),
    }
}

fn run_onboard(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to Minerva!").bold().cyan());
    println!("Let's set up your configuration.\n");

    if loader.config_exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Onboarding cancelled.");
            return Ok(());
        }
    }

    let labels: Vec<&str> = Provider::ALL.iter().map(|p| p.label()).collect();
    let selected = Select::new()
        .with_prompt("Select your provider")
        .items(&labels)
        .default(0)
        .interact()?;
    let provider = Provider::ALL[selected];

    let api_key: String = Input::new()
        .with_prompt(format!("Enter your {} API key", provider.label()))
        .interact_text()?;

    let search_key: String = Input::new()
        .with_prompt("Enter your Tavily search API key")
        .interact_text()?;

    let backend_url: String = Input::new()
        .with_prompt("Relay backend URL")
        .default("http://localhost:8000".to_string())
        .interact_text()?;

    let mut config = Config::default();
    config.chat.provider = provider.key().to_string();
    config.chat.backend_url = backend_url;
    config.credentials.api_key = api_key;
    config.credentials.search_key = search_key;

    loader.save(&config)?;
    ensure_dir(expand_tilde(&config.storage.dir));

    println!();
    println!("{}", style("Configuration saved!").green().bold());
    println!(
        "Config location: {}",
        loader.config_dir().join("config.json").display()
    );
    println!("\nYou can now run:");
    println!(
        "  {} - Open the chat screen",
        style("minerva chat").cyan()
    );
    println!(
        "  {} - Send a single message",
        style("minerva send \"Hello!\"").cyan()
    );

    Ok(())
}

async fn run_send(config: &Config, message: String, session: Option<String>) -> Result<()> {
    let provider = resolve_provider(config)?;
    let mut store = open_store(config);
    let session_id = match session {
        Some(id) => {
            store.select(&id);
            id
        }
        None => store.start_new(),
    };

    let backend = Arc::new(HttpBackend::new(config.chat.backend_url.clone()));
    let client = ChatClient::new(backend);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Waiting for {}...", provider.label()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = client
        .send(&mut store, &session_id, &message, &config.credentials, provider)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(content) => {
            println!("{}", style("Response:").bold());
            println!("{}", content);
            println!("\nSession: {}", session_id);
        }
        Err(SendError::MissingCredentials) => {
            println!(
                "{}",
                style("Both API keys must be configured before sending.").red()
            );
            println!(
                "Run {} or set OPENAI_API_KEY and TAVILY_API_KEY.",
                style("minerva onboard").cyan()
            );
        }
        Err(SendError::Backend(e)) => {
            error!("Exchange failed: {}", e);
            anyhow::bail!("Failed to send message: {}", e);
        }
    }

    Ok(())
}

fn run_sessions(config: &Config, command: SessionCommands) -> Result<()> {
    let mut store = open_store(config);

    match command {
        SessionCommands::List => {
            if store.is_empty() {
                println!(
                    "No sessions yet. Start one with {}.",
                    style("minerva chat").cyan()
                );
                return Ok(());
            }
            println!("{}", style("Sessions (newest first):").bold());
            for session in store.recent() {
                let tags = if session.tags.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", session.tags.join(", "))
                };
                println!(
                    "  {}  {}  {}  ({} messages){}",
                    style(short_id(&session.id)).dim(),
                    format_timestamp(session.timestamp),
                    style(truncate(&session.title, 40)).bold(),
                    session.messages.len(),
                    tags
                );
            }
        }
        SessionCommands::Delete { id } => {
            if store.delete(&id) {
                println!("{}", style(format!("Deleted session {}", id)).green());
            } else {
                println!("{}", style(format!("No session with id {}", id)).red());
            }
        }
        SessionCommands::Clear => {
            let count = store.len();
            if count == 0 {
                println!("Nothing to clear.");
                return Ok(());
            }
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete all chat history ({} sessions)?", count))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Clear cancelled.");
                return Ok(());
            }
            store.clear_all();
            println!("{}", style("All sessions deleted.").green());
        }
        SessionCommands::Rename { id, title } => {
            store.require(&id)?;
            store.update_meta(&id, SessionPatch::title(title));
            println!("{}", style("Session renamed.").green());
        }
        SessionCommands::Tag { id, add, remove } => {
            store.require(&id)?;
            if add.is_none() && remove.is_none() {
                println!("Nothing to do: pass --add or --remove.");
                return Ok(());
            }
            if let Some(tag) = add {
                if store.add_tag(&id, &tag) {
                    println!("Added tag '{}'", tag);
                } else {
                    println!("Tag '{}' is already present", tag);
                }
            }
            if let Some(tag) = remove {
                if store.remove_tag(&id, &tag) {
                    println!("Removed tag '{}'", tag);
                } else {
                    println!("Tag '{}' was not present", tag);
                }
            }
        }
    }

    Ok(())
}

async fn run_export(
    config: &Config,
    session: Option<String>,
    title: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config);
    let session_id = match session {
        Some(id) => id,
        None => store
            .recent()
            .first()
            .map(|s| s.id.clone())
            .ok_or_else(|| anyhow::anyhow!("No sessions to export"))?,
    };

    let stored_title = store.require(&session_id)?.title.trim().to_string();
    let title = title.unwrap_or_else(|| {
        if stored_title.is_empty() {
            "Research Report".to_string()
        } else {
            stored_title
        }
    });

    let backend = Arc::new(HttpBackend::new(config.chat.backend_url.clone()));
    let client = ChatClient::new(backend);

    println!("{}", style("Rendering PDF...").cyan());
    let bytes = match client.export(&store, &session_id, &title).await {
        Ok(bytes) => bytes,
        Err(ExportError::EmptyConversation) => {
            println!(
                "{}",
                style("Nothing to export: the conversation is empty.").red()
            );
            return Ok(());
        }
        Err(e) => {
            error!("Export failed: {}", e);
            anyhow::bail!("Failed to export conversation: {}", e);
        }
    };

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("{}.pdf", safe_filename(&title))));
    std::fs::write(&output, &bytes)?;
    println!("{} {}", style("Saved").green().bold(), output.display());

    Ok(())
}

async fn run_status(loader: &ConfigLoader, config: &Config) -> Result<()> {
    println!("{}", style("Minerva Status").bold().cyan());
    println!();

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!(
        "  Sessions file: {}",
        config.storage.sessions_path().display()
    );
    match Provider::from_name(&config.chat.provider) {
        Some(provider) => {
            let endpoint = provider.endpoint();
            println!("  Provider: {} ({})", provider.label(), endpoint.model);
        }
        None => println!(
            "  Provider: {}",
            style(format!("unknown key '{}'", config.chat.provider)).red()
        ),
    }
    println!();

    println!("{}", style("Credentials:").bold());
    let entries = [
        ("Provider API key", &config.credentials.api_key),
        ("Search API key", &config.credentials.search_key),
    ];
    for (name, value) in entries {
        let state = if value.trim().is_empty() {
            style("not configured").red()
        } else {
            style("configured").green()
        };
        println!("  {}: {}", name, state);
    }
    println!();

    let store = open_store(config);
    println!("{}", style("Sessions:").bold());
    println!("  {} stored", store.len());
    println!();

    println!("{}", style("Relay:").bold());
    println!("  URL: {}", config.chat.backend_url);
    let backend = HttpBackend::new(config.chat.backend_url.clone());
    match backend.health().await {
        Ok(health) => println!(
            "  Health: {} (version {})",
            style(&health.status).green(),
            health.version
        ),
        Err(e) => println!("  Health: {} ({})", style("unreachable").red(), e),
    }

    Ok(())
}

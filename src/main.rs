use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;
use std::path::PathBuf;

use glean::config::{Config, YOUTUBE_API_KEY_ENV};
use glean::refresh::{self, Sources};
use glean::sources::youtube::lookup_channel_id;

/// Local secrets file read before the environment is consulted.
const ENV_FILE: &str = ".env.local";

#[derive(Parser, Debug)]
#[command(
    name = "glean",
    about = "Refreshes the latest video, podcast episode and blog post of a portfolio site"
)]
struct Args {
    /// Configuration file (optional, defaults apply when missing)
    #[arg(long, value_name = "FILE", default_value = "glean.toml")]
    config: PathBuf,

    /// Content document to read and rewrite (overrides the config file)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Fetch and print the merged document without writing it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up the channel id of a legacy YouTube username
    ChannelId {
        /// YouTube Data API key (falls back to YOUTUBE_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Legacy username to resolve
        #[arg(long, default_value = "devpicon")]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env.local is the normal case outside a dev machine
    let env_file_loaded = dotenv::from_filename(ENV_FILE).is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("glean=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if env_file_loaded {
        tracing::debug!(file = ENV_FILE, "Loaded environment file");
    }

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from '{}'", args.config.display()))?
        .apply_env(|key| std::env::var(key).ok());

    let client = config
        .http_client()
        .context("Failed to build HTTP client")?;

    match args.command {
        Some(Command::ChannelId { api_key, username }) => {
            let api_key = api_key
                .or_else(|| config.youtube.api_key.clone())
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from)
                .with_context(|| {
                    format!("No API key given: pass --api-key or set {YOUTUBE_API_KEY_ENV}")
                })?;
            run_channel_id(&client, &config, &api_key, &username).await
        }
        None => {
            let output = args.output.unwrap_or_else(|| config.output.clone());
            run_refresh(&client, &config, output, args.dry_run).await
        }
    }
}

async fn run_refresh(
    client: &reqwest::Client,
    config: &Config,
    output: PathBuf,
    dry_run: bool,
) -> Result<()> {
    let sources = Sources::from_config(client, config);
    let document = refresh::run(&sources, &output, dry_run)
        .await
        .with_context(|| format!("Failed to write content document '{}'", output.display()))?;

    let mut stdout = std::io::stdout().lock();
    if dry_run {
        let json = glean::storage::to_pretty_json(&document)
            .context("Failed to serialize content document")?;
        stdout.write_all(json.as_bytes())?;
    }
    refresh::write_summary(&mut stdout, &document)?;
    Ok(())
}

async fn run_channel_id(
    client: &reqwest::Client,
    config: &Config,
    api_key: &SecretString,
    username: &str,
) -> Result<()> {
    let channel = lookup_channel_id(client, config, api_key.expose_secret(), username)
        .await
        .context("Channel lookup failed")?;

    match channel {
        Some(channel) => {
            println!("Channel: {}", channel.title);
            println!("Channel ID: {}", channel.id);
            println!();
            println!("Add to {ENV_FILE}:");
            println!("YOUTUBE_CHANNEL_ID={}", channel.id);
        }
        None => anyhow::bail!(
            "No channel found for username '{username}'. \
             Copy the id from the channel page instead: it starts with 'UC'."
        ),
    }
    Ok(())
}

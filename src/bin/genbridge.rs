//! CLI for genbridge: prompt-to-provider text and image generation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use genbridge::extract::{decode_data_uri, with_image_extension};
use genbridge::providers::ProviderKind;
use genbridge::request::{GenerationRequest, Modality};
use genbridge::{server, Config, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genbridge")]
#[command(about = "Bridge prompts to text and image generation APIs (Hugging Face, Eden AI, Gemini, OpenAI, DeepAI)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Generate text and/or an image from a prompt
    Generate(GenerateArgs),

    /// List available providers
    Providers(ProvidersArgs),
}

#[derive(Args)]
struct ProvidersArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Extra attempts for retryable provider failures
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt
    prompt: String,

    /// What to generate
    #[arg(short, long, value_enum, default_value = "both")]
    mode: ModeArg,

    /// Text provider (overrides GENBRIDGE_TEXT_PROVIDER)
    #[arg(long)]
    text_provider: Option<ProviderKind>,

    /// Image provider (overrides GENBRIDGE_IMAGE_PROVIDER)
    #[arg(long)]
    image_provider: Option<ProviderKind>,

    /// Per-call timeout in seconds (overrides GENBRIDGE_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// Extra attempts for retryable provider failures
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Token budget for the text call
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature for the text call (0.0 - 2.0)
    #[arg(long)]
    temperature: Option<f64>,

    /// Image size, e.g. 512x512
    #[arg(long)]
    resolution: Option<genbridge::request::Resolution>,

    /// Write the generated image to this path (extension added from the image if missing)
    #[arg(short = 'o', long)]
    image_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Both,
    Text,
    Image,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv(dotenvy::dotenv())?;
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::Generate(args) => generate(args).await?,
        Commands::Providers(args) => list_providers(args.json)?,
    }

    Ok(())
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn load_dotenv(loaded: Result<PathBuf, dotenvy::Error>) -> anyhow::Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context("failed to load .env")),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genbridge=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> anyhow::Result<Config> {
    Ok(Config::from_lookup(|name| std::env::var(name).ok())?)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate()?;

    let orchestrator = Orchestrator::from_config(&config)?.with_retries(args.retries);
    server::serve(&config, Arc::new(orchestrator)).await?;
    Ok(())
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(kind) = args.text_provider {
        config.text_provider = kind;
    }
    if let Some(kind) = args.image_provider {
        config.image_provider = kind;
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.validate()?;

    let mut request = GenerationRequest::new(args.prompt);
    if let Some(n) = args.max_tokens {
        request = request.with_max_tokens(n);
    }
    if let Some(t) = args.temperature {
        request = request.with_temperature(t);
    }
    request.image.resolution = args.resolution;

    let orchestrator = Orchestrator::from_config(&config)?.with_retries(args.retries);
    let result = match args.mode {
        ModeArg::Both => orchestrator.generate(&request).await?,
        ModeArg::Text => orchestrator.generate_text(&request).await?,
        ModeArg::Image => orchestrator.generate_image(&request).await?,
    };

    if let Some(path) = &args.image_out {
        match &result.image_base64 {
            Some(data_uri) => {
                let bytes = decode_data_uri(data_uri)?;
                let path = with_image_extension(path, &bytes);
                std::fs::write(&path, bytes)?;
                tracing::info!(path = %path.display(), "image written");
            }
            None => tracing::warn!("no inline image to write; see imageUrl"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn list_providers(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ProviderInfo {
        name: &'static str,
        kind: &'static str,
        modalities: Vec<Modality>,
        env_var: &'static str,
        key_set: bool,
        enabled: bool,
    }

    let config = load_config()?;
    let providers: Vec<ProviderInfo> = ProviderKind::ALL
        .into_iter()
        .map(|kind| ProviderInfo {
            name: kind.display_name(),
            kind: kind.as_str(),
            modalities: kind.modalities().to_vec(),
            env_var: kind.credential_env(),
            key_set: config.credentials.has(kind),
            enabled: kind.is_enabled(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&providers)?);
    } else {
        println!("Available providers:\n");
        for p in &providers {
            let status = if p.enabled { "✓" } else { "✗" };
            let modalities: Vec<String> = p.modalities.iter().map(ToString::to_string).collect();
            println!("  {} {} ({}) [{}]", status, p.name, p.kind, modalities.join(", "));
            println!(
                "    API key: {} ({})",
                p.env_var,
                if p.key_set { "set" } else { "not set" }
            );
        }
    }

    Ok(())
}

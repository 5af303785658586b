//! cinesearch - terminal movie search over the TMDB API.

/// Application configuration (TOML).
mod config;
/// Terminal UI components.
mod tui;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cinesearch_api::query::QueryClient;
use cinesearch_api::tmdb::TmdbClient;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, resolve_config_path};
use crate::tui::cards::render_cards;
use crate::tui::labels::Labels;
use crate::tui::{BrowserOptions, run_browser};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Append logs to this file instead of stdout (the TUI discards them otherwise).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Browse search results interactively.
    Tui(TuiArgs),
    /// Run one search and print the result cards.
    Search(SearchArgs),
    /// Manage the config file.
    Config(ConfigCommand),
    /// Print shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `tui` subcommand.
#[derive(clap::Args)]
struct TuiArgs {
    /// Initial search string.
    #[arg(long)]
    query: Option<String>,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "Matrix").
    #[arg(long, required = true)]
    query: String,
    /// Response language (default: `tmdb.language`, else the API default).
    #[arg(long)]
    language: Option<String>,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a config file with default settings.
    Init(ConfigInitArgs),
    /// Print the config file path.
    Path,
}

/// Arguments for the `config init` subcommand.
#[derive(clap::Args)]
struct ConfigInitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: Shell,
}

/// Loads the config file for `dir` (defaults when missing).
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let path = resolve_config_path(dir)?;
    AppConfig::load(&path)
}

/// Builds the cached search client from config and environment.
///
/// # Errors
///
/// Returns an error if no credential is configured, the base URL is invalid,
/// or the HTTP client fails to build.
fn build_query_client(
    config: &AppConfig,
    language: Option<String>,
) -> Result<QueryClient<TmdbClient>> {
    let credential = config.tmdb.credential(|name| std::env::var(name).ok())?;

    let mut builder = TmdbClient::builder()
        .credential(credential)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
    if let Some(ref base_url) = config.tmdb.base_url {
        let url =
            Url::parse(base_url).with_context(|| format!("invalid tmdb.base_url: {base_url}"))?;
        builder = builder.base_url(url);
    }
    let api = builder.build().context("failed to build API client")?;

    Ok(QueryClient::builder(api)
        .stale_time(Duration::from_secs(config.cache.stale_time_secs))
        .gc_time(Duration::from_secs(config.cache.gc_time_secs))
        .language(language)
        .include_adult(config.tmdb.include_adult)
        .build())
}

/// Runs the `tui` subcommand.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the terminal fails.
#[instrument(skip_all)]
async fn run_tui(args: TuiArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_query_client(&config, config.tmdb.language.clone())?;

    let options = BrowserOptions {
        initial_query: args.query,
        labels: Labels::for_language(config.ui.language),
        debounce: Duration::from_millis(config.ui.debounce_ms),
        images: config.images,
    };
    run_browser(client, options).await
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the search fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let language = args
        .language
        .clone()
        .or_else(|| config.tmdb.language.clone());
    let client = build_query_client(&config, language)?;

    let result = client
        .fetch(&args.query)
        .await
        .context("failed to search movies")?;

    let labels = Labels::for_language(config.ui.language);
    let cards = render_cards(&result, &config.images, &labels);

    tracing::info!("ID\tYear\tTitle\tPoster");
    for card in &cards {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            card.movie.id,
            card.year_label,
            card.title(),
            card.image_url,
        );
    }
    tracing::info!("Total: {} of {} results", cards.len(), result.total_results);

    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the file exists (without `--force`) or cannot be written.
fn run_config_init(args: &ConfigInitArgs, dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    if path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save(&path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Runs the `config path` subcommand.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
fn run_config_path(dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    tracing::info!("{}", path.display());
    Ok(())
}

/// Writes completions for `shell` to stdout.
fn run_completions(shell: Shell) {
    clap_complete::generate(shell, &mut Cli::command(), "cinesearch", &mut io::stdout());
}

/// Chooses the log destination.
///
/// `--log-file` wins. Otherwise the TUI discards logs so they cannot draw over
/// the screen, and every other command logs to stdout.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
fn log_writer(log_file: Option<&Path>, interactive: bool) -> Result<BoxMakeWriter> {
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        return Ok(BoxMakeWriter::new(Arc::new(file)));
    }
    if interactive {
        Ok(BoxMakeWriter::new(io::sink))
    } else {
        Ok(BoxMakeWriter::new(io::stdout))
    }
}

/// Installs the global tracing subscriber.
fn init_tracing(writer: BoxMakeWriter, ansi: bool) {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, Commands::Tui(_));
    let writer = log_writer(cli.log_file.as_deref(), interactive)?;
    init_tracing(writer, cli.log_file.is_none());

    match cli.command {
        Commands::Tui(args) => run_tui(args, cli.dir.as_ref()).await,
        Commands::Search(args) => run_search(&args, cli.dir.as_ref()).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Init(args) => run_config_init(&args, cli.dir.as_ref()),
            ConfigSubcommands::Path => run_config_path(cli.dir.as_ref()),
        },
        Commands::Completions(args) => {
            run_completions(args.shell);
            Ok(())
        }
    }
}

//! moviedeck - browse, search and inspect TMDB movies from the terminal.

/// Application configuration (TOML).
mod config;
/// Terminal UI components.
mod tui;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use moviedeck_api::tmdb::{
    ApiError, CredentialProvider, MovieSummary, PagedMovies, TimeWindow, TmdbApi, TmdbClient,
};
use moviedeck_core::details::DetailsView;
use moviedeck_core::format::rating_label;
use moviedeck_core::key_store::KeyStore;
use moviedeck_core::prefs::FilePreferences;
use moviedeck_core::search::SearchController;
use moviedeck_core::session::Session;
use moviedeck_core::validation::ValidationState;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, resolve_config_path, resolve_data_dir};
use crate::tui::run_browser;

/// Environment variable overriding the API base URL.
const BASE_URL_ENV: &str = "TMDB_BASE_URL";

/// Shown when a command needs a key that is missing or was rejected.
const KEY_HINT: &str = "No valid TMDB API key. Run `moviedeck key set <KEY>` first.";

/// Key store backed by `prefs.toml` in the data directory.
type FileKeyStore = KeyStore<FilePreferences>;

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Manage the stored TMDB API key.
    Key(KeyCommand),
    /// Manage the config file.
    Config(ConfigCommand),
    /// List popular movies.
    Popular,
    /// List trending movies.
    Trending(TrendingArgs),
    /// Search for movies.
    Search(SearchArgs),
    /// Show details and cast of a movie.
    Details(DetailsArgs),
    /// Browse movies in the interactive TUI.
    Browse,
}

/// Arguments for the `key` subcommand.
#[derive(clap::Args)]
struct KeyCommand {
    /// Key subcommand to run.
    #[command(subcommand)]
    command: KeySubcommands,
}

/// Available key subcommands.
#[derive(Subcommand)]
enum KeySubcommands {
    /// Validate a key against TMDB and store it.
    Set(KeySetArgs),
    /// Show whether a key is stored (masked).
    Show,
    /// Delete the stored key.
    Clear,
}

/// Arguments for the `key set` subcommand.
#[derive(clap::Args)]
struct KeySetArgs {
    /// TMDB v3 API key.
    key: String,
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
}

/// Arguments for the `config init` subcommand.
#[derive(clap::Args)]
struct ConfigInitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    force: bool,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "star wars").
    #[arg(long, required = true)]
    query: String,
    /// Number of result pages to fetch.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Use the weekly window instead of today.
    #[arg(long)]
    week: bool,
}

impl TrendingArgs {
    const fn window(&self) -> TimeWindow {
        if self.week {
            TimeWindow::Week
        } else {
            TimeWindow::Day
        }
    }
}

/// Arguments for the `details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// TMDB movie ID (e.g. 27205).
    #[arg(long, required = true)]
    id: u64,
}

/// Opens the key store in the data directory.
///
/// # Errors
///
/// Returns an error if the data directory cannot be resolved.
fn open_key_store(dir: Option<&PathBuf>) -> Result<Arc<FileKeyStore>> {
    let data_dir = resolve_data_dir(dir)?;
    Ok(Arc::new(KeyStore::new(FilePreferences::in_dir(&data_dir))))
}

/// Builds a `TmdbClient` that reads its key from `key_store` on every request.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, the base URL override is
/// invalid, or the client fails to build.
fn build_tmdb_client(dir: Option<&PathBuf>, key_store: &Arc<FileKeyStore>) -> Result<TmdbClient> {
    let config_path = resolve_config_path(dir)?;
    let config = AppConfig::load(&config_path)?;

    let credentials: Arc<dyn CredentialProvider> = Arc::<FileKeyStore>::clone(key_store);
    let mut builder = TmdbClient::builder()
        .credentials(credentials)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .language(config.tmdb.language.as_str())
        .timeout(config.tmdb.timeout());

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        let url = Url::parse(&base_url)
            .with_context(|| format!("invalid {BASE_URL_ENV}: {base_url}"))?;
        builder = builder.base_url(url);
    }

    builder.build().context("failed to build TMDB client")
}

/// Fails with a hint when no key is stored.
///
/// # Errors
///
/// Returns an error if no API key is stored.
fn require_stored_key(key_store: &Arc<FileKeyStore>) -> Result<()> {
    let session = Session::new(Arc::clone(key_store));
    if !session.has_key() {
        bail!(KEY_HINT);
    }
    Ok(())
}

/// Converts an API error, pointing at `key set` for credential errors.
fn api_failure(err: ApiError, what: &str) -> anyhow::Error {
    if err.is_credential_error() {
        return anyhow::Error::new(err).context(KEY_HINT);
    }
    anyhow::Error::new(err).context(format!("TMDB {what} request failed"))
}

/// Masks all but the last four characters of a key.
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    let visible: String = key.chars().skip(count.saturating_sub(4)).collect();
    format!("{}{visible}", "*".repeat(count.saturating_sub(4)))
}

/// Logs one movie per line: ID, title, year, rating.
fn log_movies(movies: &[MovieSummary]) {
    tracing::info!("ID\tTitle\t\t\tYear\tRating");
    for movie in movies {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            movie.id,
            movie.title,
            movie.release_year().unwrap_or("-"),
            rating_label(movie.vote_average),
        );
    }
}

/// Logs a listing response.
fn log_listing(response: &PagedMovies) {
    tracing::info!(
        "Page {}/{} ({} results)",
        response.page,
        response.total_pages,
        response.total_results
    );
    log_movies(&response.results);
}

/// Runs the `key set` subcommand.
///
/// # Errors
///
/// Returns an error if the key is blank, rejected, cannot be checked, or
/// cannot be stored.
#[instrument(skip_all)]
async fn run_key_set(args: &KeySetArgs, dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    let client = build_tmdb_client(dir, &key_store)?;
    let mut session = Session::new(Arc::clone(&key_store));

    let state = session.submit_key(&client, &args.key).await?;
    match state {
        ValidationState::Valid => {
            tracing::info!("API key saved");
            Ok(())
        }
        ValidationState::Invalid(message) | ValidationState::NetworkError(message) => {
            bail!(message)
        }
        ValidationState::Idle | ValidationState::Validating => {
            bail!("API key validation did not finish")
        }
    }
}

/// Runs the `key show` subcommand.
///
/// # Errors
///
/// Returns an error if the data directory cannot be resolved.
fn run_key_show(dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    match key_store.load() {
        Some(key) => tracing::info!("API key: {}", mask_key(&key)),
        None => tracing::info!("No API key stored"),
    }
    Ok(())
}

/// Runs the `key clear` subcommand.
///
/// # Errors
///
/// Returns an error if the preference file cannot be written.
fn run_key_clear(dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    key_store.clear()?;
    tracing::info!("API key removed");
    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the file exists without `--force`, or cannot be written.
fn run_config_init(args: &ConfigInitArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir)?;
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    AppConfig::default().save(&config_path)?;
    tracing::info!("Wrote {}", config_path.display());
    Ok(())
}

/// Runs the `popular` subcommand.
///
/// # Errors
///
/// Returns an error if no key is stored or the API request fails.
#[instrument(skip_all)]
async fn run_popular(dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    require_stored_key(&key_store)?;
    let client = build_tmdb_client(dir, &key_store)?;

    let response = client
        .popular_movies(1)
        .await
        .map_err(|e| api_failure(e, "movie/popular"))?;
    log_listing(&response);
    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if no key is stored or the API request fails.
#[instrument(skip_all)]
async fn run_trending(args: &TrendingArgs, dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    require_stored_key(&key_store)?;
    let client = build_tmdb_client(dir, &key_store)?;

    let response = client
        .trending_movies(args.window())
        .await
        .map_err(|e| api_failure(e, "trending/movie"))?;
    log_listing(&response);
    Ok(())
}

/// Runs the `search` subcommand, fetching up to `--pages` pages.
///
/// # Errors
///
/// Returns an error if no key is stored, the query is blank, or the first
/// page cannot be fetched.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    require_stored_key(&key_store)?;
    let client = build_tmdb_client(dir, &key_store)?;

    let mut search = SearchController::new(Arc::new(client));
    search.set_query(&args.query);
    if search.session().is_none() {
        bail!("search query cannot be empty");
    }
    if !search.settle().await {
        bail!("TMDB search/movie request failed");
    }

    let mut fetched: u32 = 1;
    while fetched < args.pages && search.fetch_next_page() {
        if !search.settle().await {
            break;
        }
        fetched = fetched.saturating_add(1);
    }

    let Some(session) = search.session() else {
        bail!("search was cancelled");
    };
    tracing::info!("{}", session.label());
    tracing::info!(
        "Pages {}/{}",
        session.current_page,
        session.total_pages
    );
    log_movies(&session.results);
    Ok(())
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if no key is stored or the details request fails.
#[instrument(skip_all)]
async fn run_details(args: &DetailsArgs, dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    require_stored_key(&key_store)?;
    let client = build_tmdb_client(dir, &key_store)?;

    let details = client
        .movie_details(args.id)
        .await
        .map_err(|e| api_failure(e, "movie details"))?;
    let credits = client
        .movie_credits(args.id)
        .await
        .inspect_err(|e| tracing::warn!(movie_id = args.id, error = %e, "Failed to load movie credits"))
        .ok();

    let view = DetailsView::assemble(
        details.summary(),
        Some(&details),
        credits,
        client.image_base_url(),
    );

    tracing::info!("{} (ID: {})", view.movie.title, view.movie.id);
    tracing::info!("{}", view.metadata);
    if let Some(tagline) = &view.tagline {
        tracing::info!("{tagline}");
    }
    if let Some(runtime) = view.runtime {
        tracing::info!("Runtime: {runtime} min");
    }
    tracing::info!("Overview: {}", view.movie.overview);
    if let Some(url) = &view.artwork_url {
        tracing::info!("Artwork: {url}");
    }
    tracing::info!("Cast:");
    for member in &view.cast {
        tracing::info!("  {} as {}", member.name, member.character);
    }
    Ok(())
}

/// Runs the `browse` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the TUI fails.
async fn run_browse(dir: Option<&PathBuf>) -> Result<()> {
    let key_store = open_key_store(dir)?;
    let client = build_tmdb_client(dir, &key_store)?;
    let image_base = String::from(client.image_base_url());
    let session = Session::new(key_store);

    run_browser(Arc::new(client), session, image_base).await
}

/// Log file written while the browser owns the terminal.
const LOG_FILE_NAME: &str = "moviedeck.log";

/// Where log output goes.
#[derive(Debug)]
enum LogTarget {
    /// Command output on stdout.
    Stdout,
    /// Appended to a file; stdout is the TUI's screen.
    File(File),
}

impl LogTarget {
    /// Logs to `{data_dir}/moviedeck.log` for `browse`, else to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be opened.
    fn for_cli(cli: &Cli) -> Result<Self> {
        if !matches!(cli.command, Commands::Browse) {
            return Ok(Self::Stdout);
        }
        let data_dir = resolve_data_dir(cli.dir.as_ref())?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create directory {}", data_dir.display()))?;
        let path = data_dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self::File(file))
    }

    const fn ansi(&self) -> bool {
        matches!(self, Self::Stdout)
    }

    fn into_writer(self) -> BoxMakeWriter {
        match self {
            Self::Stdout => BoxMakeWriter::new(io::stdout),
            Self::File(file) => BoxMakeWriter::new(Mutex::new(file)),
        }
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
    let log_target = LogTarget::for_cli(&cli)?;

    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(log_target.ansi())
            .with_writer(log_target.into_writer())
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(log_target.ansi())
            .with_writer(log_target.into_writer());

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

    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Key(key) => match key.command {
            KeySubcommands::Set(args) => run_key_set(&args, dir).await,
            KeySubcommands::Show => run_key_show(dir),
            KeySubcommands::Clear => run_key_clear(dir),
        },
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Init(args) => run_config_init(&args, dir),
        },
        Commands::Popular => run_popular(dir).await,
        Commands::Trending(args) => run_trending(&args, dir).await,
        Commands::Search(args) => run_search(&args, dir).await,
        Commands::Details(args) => run_details(&args, dir).await,
        Commands::Browse => run_browse(dir).await,
    }
}

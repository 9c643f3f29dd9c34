//! Beanmap - find nearby coffee shops from the terminal.
//!
//! Locates the user, lists coffee shops around them from OpenStreetMap, and
//! keeps personal notes and photos for each shop on disk.

mod app;
mod capture;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use beanmap_core::api::nearby_shops;
use beanmap_core::geo::{FixedLocator, IpLocator, Locator};
use beanmap_core::offline::{AssetRequest, CacheState, HttpFetcher, OfflineWorker};
use beanmap_core::store::{FileStore, KeyValueStore, ShopStore};
use beanmap_core::{Config, OverpassClient, ShopRecord};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "beanmap.log";

const USAGE: &str = "\
Usage: beanmap [OPTION]

With no option, starts the interactive terminal UI.

Options:
  --nearby               Print nearby coffee shops as JSON and exit
  --install-assets       Pre-populate the offline asset cache
  --activate-assets      Delete stale asset cache generations
  --fetch-asset <URL>    Fetch one asset through the offline cache
  -h, --help             Show this help";

/// Command-line mode selected by the arguments.
enum Command {
    Tui,
    Nearby,
    InstallAssets,
    ActivateAssets,
    FetchAsset(String),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args.get(1).map(String::as_str) {
        None => Ok(Command::Tui),
        Some("--nearby") => Ok(Command::Nearby),
        Some("--install-assets") => Ok(Command::InstallAssets),
        Some("--activate-assets") => Ok(Command::ActivateAssets),
        Some("--fetch-asset") => args
            .get(2)
            .cloned()
            .map(Command::FetchAsset)
            .ok_or_else(|| anyhow!("--fetch-asset requires a URL")),
        Some("-h") | Some("--help") => Ok(Command::Help),
        Some(other) => Err(anyhow!("Unknown option: {}\n\n{}", other, USAGE)),
    }
}

/// Log to stderr for one-shot commands.
fn init_cli_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a daily file while the terminal UI owns the screen.
fn init_tui_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

fn load_config() -> Result<Config> {
    Config::load()?.with_env_overrides(|key| std::env::var(key).ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;
    if matches!(command, Command::Help) {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = load_config()?;

    match command {
        Command::Tui => run_tui(config).await,
        other => {
            init_cli_tracing();
            match other {
                Command::Nearby => print_nearby(&config).await,
                Command::InstallAssets => install_assets(&config).await,
                Command::ActivateAssets => activate_assets(&config),
                Command::FetchAsset(url) => fetch_asset(&config, &url).await,
                Command::Tui | Command::Help => Ok(()),
            }
        }
    }
}

async fn run_tui(config: Config) -> Result<()> {
    let _guard = init_tui_tracing(&config)?;
    info!("Beanmap starting");

    let mut app = App::new(config)?;
    app.start_lookup();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    app.release_capture();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        error!(error = %e, "Beanmap exited with an error");
        eprintln!("Error: {}", e);
    }

    info!("Beanmap shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background lookups land without a keypress
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// One-shot commands
// ============================================================================

async fn print_nearby(config: &Config) -> Result<()> {
    let locator: Box<dyn Locator> = match config.location {
        Some(position) => Box::new(FixedLocator::new(position)),
        None => Box::new(IpLocator::new(config.locator_url.clone())?),
    };
    let position = locator.locate().await.context("Error getting location")?;
    eprintln!("Searching around {}...", position.display());

    let client = OverpassClient::new(config.overpass_url.clone())?;
    let nearby = nearby_shops(&client, position, config.radius_meters).await;
    if let Some(ref message) = nearby.error {
        return Err(anyhow!("{}", message));
    }

    let store = ShopStore::new(FileStore::open(config.data_dir()?)?);
    let mut shops = nearby.shops;
    attach_saved(&store, &mut shops);

    println!("{}", serde_json::to_string_pretty(&shops)?);
    eprintln!("{} coffee shops found", shops.len());
    Ok(())
}

/// Fill in each shop's saved notes and photos. A shop whose saved data
/// cannot be read is printed without it.
fn attach_saved<S: KeyValueStore>(store: &ShopStore<S>, shops: &mut [ShopRecord]) {
    for shop in shops.iter_mut() {
        if let Err(e) = store.attach(shop) {
            warn!(shop_id = shop.id, error = %e, "Could not read saved data");
        }
    }
}

fn offline_worker(config: &Config) -> Result<OfflineWorker> {
    let worker_config = config
        .worker_config()?
        .ok_or_else(|| anyhow!("asset_origin is not set in the config; the offline cache is disabled"))?;
    Ok(OfflineWorker::new(worker_config))
}

async fn install_assets(config: &Config) -> Result<()> {
    let worker = offline_worker(config)?;
    let dir = config.asset_cache_dir()?;
    let fetcher = HttpFetcher::new(&worker.config().origin)?;

    let state = CacheState::load(&dir)?;
    let (state, report) = worker.install(state, &fetcher).await;
    state.save(&dir)?;

    eprintln!(
        "Generation {}: {} cached, {} failed",
        report.generation,
        report.cached.len(),
        report.failed.len()
    );
    for (asset, reason) in &report.failed {
        eprintln!("  Failed to cache {}: {}", asset, reason);
    }
    Ok(())
}

fn activate_assets(config: &Config) -> Result<()> {
    let worker = offline_worker(config)?;
    let dir = config.asset_cache_dir()?;

    let state = CacheState::load(&dir)?;
    let (state, deleted) = worker.activate(state);
    state.save(&dir)?;

    if deleted.is_empty() {
        eprintln!("No stale generations");
    }
    for name in deleted {
        eprintln!("Deleted {}", name);
    }
    Ok(())
}

async fn fetch_asset(config: &Config, target: &str) -> Result<()> {
    let worker = offline_worker(config)?;
    let dir = config.asset_cache_dir()?;
    let fetcher = HttpFetcher::new(&worker.config().origin)?;

    // Relative paths resolve against the app origin
    let url = worker.config().origin.join(target)?;
    let request = AssetRequest::from(url);

    let state = CacheState::load(&dir)?;
    let (state, result) = worker.handle_fetch(state, &request, &fetcher).await;
    state.save(&dir)?;

    let served = result?;
    eprintln!(
        "{} {} ({:?}, {} bytes)",
        served.response.status,
        request.url,
        served.source,
        served.response.body.len()
    );
    let mut stdout = io::stdout().lock();
    stdout.write_all(&served.response.body)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanmap_core::store::{notes_key, MemoryStore};
    use beanmap_core::Coordinates;

    fn shop(id: i64) -> ShopRecord {
        ShopRecord {
            id,
            name: Some(format!("Shop {}", id)),
            location: Coordinates::new(40.0, -73.0),
            address: None,
            phone: None,
            website: None,
            opening_hours: None,
            cuisine: None,
            distance_km: 0.1,
            notes: Vec::new(),
            photos: Vec::new(),
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("beanmap")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(parse_args(&args(&[])).unwrap(), Command::Tui));
        assert!(matches!(parse_args(&args(&["--nearby"])).unwrap(), Command::Nearby));
        assert!(matches!(
            parse_args(&args(&["--fetch-asset", "/index.html"])).unwrap(),
            Command::FetchAsset(url) if url == "/index.html"
        ));
        assert!(parse_args(&args(&["--fetch-asset"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_nearby_output_includes_saved_data() {
        let store = ShopStore::new(MemoryStore::new());
        store.add_note(1, "Quiet upstairs").unwrap();
        store.add_photo(1, b"jpg", "image/jpeg").unwrap();
        store.add_note(2, "Cash only").unwrap();
        store.backend().set(&notes_key(2), "{not json").unwrap();

        let mut shops = vec![shop(1), shop(2), shop(3)];
        attach_saved(&store, &mut shops);

        assert_eq!(shops[0].notes[0].text, "Quiet upstairs");
        assert_eq!(shops[0].photos.len(), 1);
        assert!(shops[1].notes.is_empty());
        assert!(shops[2].notes.is_empty() && shops[2].photos.is_empty());

        let json = serde_json::to_string(&shops).unwrap();
        assert!(json.contains("Quiet upstairs"));
    }
}

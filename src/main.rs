//! # Headline Browser
//!
//! A terminal browser for paginated, categorized top headlines served by the
//! GNews API. Headlines are shown as text cards; more pages can be loaded
//! incrementally, a category can be picked, and free text can be searched.
//!
//! ## Usage
//!
//! ```sh
//! GNEWS_API_KEY=... headline_browser -t business -p 2
//! GNEWS_API_KEY=... headline_browser -i
//! ```
//!
//! ## Architecture
//!
//! 1. **State**: [`controller::QueryStateController`] owns the browse position
//!    and turns user actions into fetch tickets
//! 2. **Fetching**: [`api::GNewsClient`] performs one request per ticket
//! 3. **Settling**: results go back through the controller, which merges them
//!    and decides what the display shows
//! 4. **Output**: cards on stdout, an optional JSON snapshot on disk

use clap::Parser;
use std::error::Error;
use tokio::io::BufReader;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod app;
mod cli;
mod config;
mod controller;
mod input;
mod models;
mod outputs;
mod theme;
mod utils;

use api::GNewsClient;
use app::App;
use cli::Cli;
use controller::{BrowseState, QueryStateController};
use outputs::json;
use theme::ThemeStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout carries the cards) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("headline_browser starting up");

    let args = Cli::parse();
    debug!(category = ?args.category, query = ?args.query, pages = args.pages, "Parsed CLI arguments");

    let mut config = config::load_config(args.config.as_deref()).await?;
    config.apply_cli(&args);
    config.validate()?;

    // Early check: fail before any network traffic if the snapshot can't be written
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = utils::ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let client = GNewsClient::new(
        &config.base_url,
        config.require_token()?,
        config.request_timeout(),
    )?;
    debug!(?client, "Headlines client ready");

    let theme_store = ThemeStore::default_location();
    let theme = theme_store.load().await;
    debug!(%theme, path = ?theme_store.path(), "Theme loaded");

    let mut state = BrowseState::new(config.page_size);
    if let Some(category) = args.category {
        state = state.with_category(category);
    }
    if let Some(query) = &args.query {
        state = state.with_query(query);
    }
    let controller = QueryStateController::new(state, config.stale_results);
    debug!(params = ?controller.request_params(), policy = ?config.stale_results, "Initial request");

    let mut app = App::new(
        controller,
        client,
        theme,
        theme_store,
        config.debounce(),
        std::io::stdout(),
    );

    if args.interactive {
        app.run_interactive(BufReader::new(tokio::io::stdin())).await?;
    } else {
        app.run_batch(args.pages).await?;
    }

    if let Some(dir) = &args.json_output_dir {
        let path = json::write_snapshot(app.controller().state(), dir).await?;
        eprintln!("saved {}", path.display());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = app.controller().state().articles.len(),
        theme = %app.theme(),
        "Execution complete"
    );
    Ok(())
}

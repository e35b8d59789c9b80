use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    HttpPageProvider, PageProvider, SelectAllPolicy, SelectionError, Session, SessionConfig,
};
use shared::domain::ArtworkId;
use storage::{normalize_database_url, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Settings, DEFAULT_DATABASE_URL};
use render::render_table;

#[derive(Parser, Debug)]
#[command(name = "artsel", about = "Page through the artwork catalog and keep a selection across pages")]
struct Cli {
    /// Catalog API base url, e.g. https://api.artic.edu/api/v1
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    /// `snapshot` or `follow`
    #[arg(long)]
    policy: Option<SelectAllPolicy>,
    /// Keep the selection in memory only.
    #[arg(long)]
    ephemeral: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of the catalog.
    Page {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Check or uncheck a single artwork.
    Toggle {
        id: i64,
        #[arg(long)]
        off: bool,
    },
    /// Check every artwork in the catalog.
    SelectAll {
        /// Only select the ids discovered so far instead of waiting for all of them.
        #[arg(long)]
        partial: bool,
    },
    /// Uncheck everything.
    Clear,
    /// List the checked artwork ids.
    Selected,
    /// Show the first page, selection count and universe progress.
    Status {
        #[arg(long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = merge_cli(load_settings(), &cli);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_seconds))
        .user_agent(concat!("artsel/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")?;
    let provider: Arc<dyn PageProvider> =
        Arc::new(HttpPageProvider::with_client(http, &settings.api_base_url)?);
    let store = open_store(&settings, cli.ephemeral).await?;

    let config = SessionConfig {
        page_size: settings.page_size,
        universe_page_size: settings.universe_page_size,
        selection_key: settings.selection_key.clone(),
        select_all_policy: settings.select_all_policy,
    };
    let mut session = match Session::start(config.clone(), provider.clone(), store.clone()).await {
        Ok(session) => session,
        Err(err) => {
            let Some(key) = corrupt_selection_key(&err) else {
                return Err(err);
            };
            if !matches!(cli.command, Command::Clear) {
                error!(%key, "stored selection is corrupt; run `artsel clear` to reset it");
                return Err(err);
            }
            warn!(%key, "discarding corrupt stored selection");
            store.set(&key, "{}").await?;
            Session::start(config, provider, store).await?
        }
    };

    match cli.command {
        Command::Page { page, size } => {
            let size = size.unwrap_or(settings.page_size);
            session.pagination_mut().show(page, size).await?;
            session.sync_universe().await;
        }
        Command::Toggle { id, off } => {
            session.selection_mut().toggle(ArtworkId(id), !off).await;
            session.sync_universe().await;
        }
        Command::SelectAll { partial } => {
            if partial {
                session.sync_universe().await;
            } else {
                session.wait_for_universe().await;
            }
            session.selection_mut().select_all(true).await;
            if session.selection().is_following_universe() {
                session.wait_for_universe().await;
            }
        }
        Command::Clear => {
            session.selection_mut().clear_all().await;
            session.sync_universe().await;
        }
        Command::Selected => {
            for id in session.selection().selection().checked_ids() {
                println!("{id}");
            }
            return Ok(());
        }
        Command::Status { wait } => {
            if wait {
                session.wait_for_universe().await;
            } else {
                session.sync_universe().await;
            }
        }
    }

    let status = session.universe().status();
    print!("{}", render_table(&session.view(), &status));
    info!(
        selected = session.selection().selection().checked_count(),
        "artsel: done"
    );
    Ok(())
}

fn corrupt_selection_key(err: &anyhow::Error) -> Option<String> {
    match err.downcast_ref::<SelectionError>() {
        Some(SelectionError::CorruptState { key, .. }) => Some(key.clone()),
        _ => None,
    }
}

fn merge_cli(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(api_url) = &cli.api_url {
        settings.api_base_url = api_url.clone();
    }
    if let Some(database_url) = &cli.database_url {
        settings.database_url = database_url.clone();
    }
    if let Some(policy) = cli.policy {
        settings.select_all_policy = policy;
    }
    settings
}

async fn open_store(settings: &Settings, ephemeral: bool) -> Result<Arc<dyn KeyValueStore>> {
    if ephemeral {
        return Ok(Arc::new(MemoryKeyValueStore::new()));
    }

    let database_url = normalize_database_url(&settings.database_url, DEFAULT_DATABASE_URL);
    let store = SqliteKeyValueStore::new(&database_url, settings.api_base_url.trim_end_matches('/'))
        .await
        .map_err(|error| {
            error!(
                %database_url,
                error = %format!("{error:#}"),
                "failed to open SQLite database; verify parent directory exists and permissions are correct"
            );
            error
        })?;
    let keys = store
        .health_check()
        .await
        .with_context(|| format!("selection store at {database_url} is not usable"))?;
    info!(%database_url, scope = store.scope(), keys, "artsel: selection store ready");
    Ok(Arc::new(store))
}

use appfeed::config::Config;
use appfeed::feed::{FeedSource, HttpFeedClient};
use appfeed::logging;
use appfeed::store::{NoopStore, RecordStore, SqliteStore};
use appfeed::{Batch, BatchSource, Pager, PagerEvent};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "appfeed")]
#[command(about = "List apps from a remote feed, cached locally and paged")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/appfeed/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Records per cached page
  #[arg(long)]
  page_size: Option<usize>,

  /// Number of batches to load
  #[arg(short, long, default_value_t = 1)]
  pages: usize,

  /// Fetch the feed before loading pages
  #[arg(short, long)]
  refresh: bool,

  /// Skip the local cache entirely
  #[arg(long)]
  no_cache: bool,

  /// Cache database path
  #[arg(long)]
  db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Command line overrides
  if let Some(page_size) = args.page_size {
    config.pager.page_size = page_size;
  }
  if let Some(db) = &args.db {
    config.cache.path = Some(db.clone());
  }
  if args.no_cache {
    config.cache.enabled = false;
  }

  let feed = HttpFeedClient::from_config(&config)?;
  info!(url = %feed.url(), page_size = config.pager.page_size, "Starting");

  if config.cache.enabled {
    let path = config.cache_path()?;
    let store = SqliteStore::open(&path)?;
    info!(path = %path.display(), cached = store.count()?, "Opened cache");
    run(Pager::new(store, feed, config.pager.page_size), &args).await
  } else {
    run(Pager::new(NoopStore, feed, config.pager.page_size), &args).await
  }
}

/// Drive the pager and print every batch it reports.
async fn run<S, F>(pager: Pager<S, F>, args: &Args) -> Result<()>
where
  S: RecordStore + 'static,
  F: FeedSource + 'static,
{
  let (tx, mut rx) = mpsc::unbounded_channel();
  let mut last_error = None;

  if args.refresh {
    pager.spawn_refresh(tx.clone()).await?;
    drain(&mut rx, &mut last_error);
  }

  for _ in 0..args.pages {
    pager.spawn_load_more(tx.clone()).await?;
    drain(&mut rx, &mut last_error);
  }

  info!(visible = pager.len(), page = pager.current_page(), "Done");

  match last_error {
    Some(e) if pager.is_empty() => Err(eyre!("No apps loaded: {}", e)),
    _ => Ok(()),
  }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<PagerEvent>, last_error: &mut Option<String>) {
  while let Ok(event) = rx.try_recv() {
    match event {
      PagerEvent::BatchAvailable(batch) => print_batch(&batch),
      PagerEvent::Failed(msg) => {
        eprintln!("Error: {}", msg);
        *last_error = Some(msg);
      }
    }
  }
}

fn print_batch(batch: &Batch) {
  let source = match batch.source {
    BatchSource::Cache => "cache",
    BatchSource::Network => "network",
  };

  if batch.is_empty() {
    println!("-- no new apps ({}) --", source);
    return;
  }

  println!("-- {} apps ({}) --", batch.len(), source);
  for (position, app) in batch.range.clone().zip(&batch.records) {
    println!(
      "{:>3}. {} | {} | {} | {}",
      position + 1,
      app.name.as_deref().unwrap_or("(unnamed)"),
      app.artist_name.as_deref().unwrap_or("-"),
      app.formatted_release_date(),
      app.genre_line()
    );
  }
}

//! Cache-then-fetch pager over the record store and the remote feed.
//!
//! `load_more` walks the store one page at a time and only reaches for the
//! network once a page comes back empty or entirely already visible.
//! `refresh` goes to the network unconditionally. Either way new records are
//! appended to an in-memory working set that never reorders or shrinks.
//!
//! At most one operation runs per pager. A call made while another is in
//! flight is dropped and returns `Ok(None)`.

mod working_set;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::event::{Batch, BatchSource, PagerEvent};
use crate::feed::{decode_feed, AppRecord, FeedSource};
use crate::store::RecordStore;

use working_set::WorkingSet;

pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Largest page size the store can express as an SQL limit.
pub const MAX_PAGE_SIZE: usize = i64::MAX as usize;

#[derive(Debug, Default)]
struct PagerState {
  working_set: WorkingSet,
  /// Next page to read from the store
  current_page: usize,
}

struct Inner<S, F> {
  store: S,
  feed: F,
  page_size: usize,
  state: Mutex<PagerState>,
  busy: AtomicBool,
}

impl<S, F> Inner<S, F> {
  fn state(&self) -> MutexGuard<'_, PagerState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Marks an operation as in flight; cleared on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
  fn begin(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self(flag))
  }
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

/// Pages app records from a store, falling back to a feed.
pub struct Pager<S, F> {
  inner: Arc<Inner<S, F>>,
}

impl<S: RecordStore, F: FeedSource> Pager<S, F> {
  /// Create a pager. The page size is clamped to `1..=MAX_PAGE_SIZE`.
  pub fn new(store: S, feed: F, page_size: usize) -> Self {
    Self {
      inner: Arc::new(Inner {
        store,
        feed,
        page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        state: Mutex::new(PagerState::default()),
        busy: AtomicBool::new(false),
      }),
    }
  }

  pub fn page_size(&self) -> usize {
    self.inner.page_size
  }

  pub fn current_page(&self) -> usize {
    self.inner.state().current_page
  }

  pub fn len(&self) -> usize {
    self.inner.state().working_set.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Whether a load or refresh is in flight.
  pub fn is_busy(&self) -> bool {
    self.inner.busy.load(Ordering::Acquire)
  }

  /// Record at `index` in the working set.
  pub fn get(&self, index: usize) -> Option<AppRecord> {
    self.inner.state().working_set.get(index).cloned()
  }

  /// Snapshot of the working set.
  pub fn records(&self) -> Vec<AppRecord> {
    self.inner.state().working_set.records().to_vec()
  }

  pub fn store(&self) -> &S {
    &self.inner.store
  }

  /// Load the next batch, from the store if it has unseen records, else
  /// from the feed.
  ///
  /// Returns `Ok(None)` when another operation is already in flight.
  pub async fn load_more(&self) -> Result<Option<Batch>, SyncError> {
    let Some(_flight) = InFlight::begin(&self.inner.busy) else {
      debug!("Load already in flight, dropping load_more");
      return Ok(None);
    };

    let page_size = self.inner.page_size;
    let page = self.current_page();

    match self.inner.store.query_page(page.saturating_mul(page_size), page_size) {
      Ok(records) if !records.is_empty() => {
        if let Some(batch) = self.append_cached_page(page, records) {
          return Ok(Some(batch));
        }
        debug!(page, "Cached page already visible, fetching feed");
      }
      Ok(_) => debug!(page, "Cache exhausted, fetching feed"),
      Err(e) => warn!(page, error = %e, "Failed to read cached page, fetching feed"),
    }

    self.fetch_from_network().await.map(Some)
  }

  /// Append the unseen part of a cached page and advance past it. `None`
  /// when every record on the page is already visible.
  fn append_cached_page(&self, page: usize, records: Vec<AppRecord>) -> Option<Batch> {
    let fetched = records.len();
    let mut state = self.inner.state();
    let batch = state
      .working_set
      .append_unseen(records, BatchSource::Cache);

    if batch.is_empty() {
      return None;
    }

    state.current_page += 1;
    info!(
      page,
      new = batch.len(),
      duplicates = fetched - batch.len(),
      "Loaded page from cache"
    );
    Some(batch)
  }

  /// Fetch the feed regardless of what the store holds.
  ///
  /// Pagination is left where it is. Returns `Ok(None)` when another
  /// operation is already in flight.
  pub async fn refresh(&self) -> Result<Option<Batch>, SyncError> {
    let Some(_flight) = InFlight::begin(&self.inner.busy) else {
      debug!("Load already in flight, dropping refresh");
      return Ok(None);
    };

    self.fetch_from_network().await.map(Some)
  }

  /// Fetch, decode, cache and append. Nothing changes unless the fetch and
  /// decode both succeed.
  async fn fetch_from_network(&self) -> Result<Batch, SyncError> {
    let payload = self.inner.feed.fetch().await.map_err(|e| {
      warn!(error = %e, "Feed fetch failed");
      e
    })?;

    let records = decode_feed(&payload).map_err(|e| {
      warn!(error = %e, "Feed decode failed");
      e
    })?;

    let mut cached = 0usize;
    for record in records.iter().filter(|r| r.has_id()) {
      match self.inner.store.upsert(record) {
        Ok(()) => cached += 1,
        Err(e) => warn!(id = %record.id, error = %e, "Failed to cache app"),
      }
    }

    let decoded = records.len();
    let batch = self
      .inner
      .state()
      .working_set
      .append_unseen(records, BatchSource::Network);

    info!(decoded, cached, new = batch.len(), "Loaded feed from network");
    Ok(batch)
  }
}

impl<S, F> Pager<S, F>
where
  S: RecordStore + 'static,
  F: FeedSource + 'static,
{
  /// Run `load_more` on a task and report the outcome on `tx`.
  ///
  /// Nothing is sent when the call is dropped because another is in flight.
  pub fn spawn_load_more(&self, tx: mpsc::UnboundedSender<PagerEvent>) -> JoinHandle<()> {
    let pager = self.clone();
    tokio::spawn(async move {
      let result = pager.load_more().await;
      Self::report(result, &tx);
    })
  }

  /// Run `refresh` on a task and report the outcome on `tx`.
  pub fn spawn_refresh(&self, tx: mpsc::UnboundedSender<PagerEvent>) -> JoinHandle<()> {
    let pager = self.clone();
    tokio::spawn(async move {
      let result = pager.refresh().await;
      Self::report(result, &tx);
    })
  }

  fn report(result: Result<Option<Batch>, SyncError>, tx: &mpsc::UnboundedSender<PagerEvent>) {
    let event = match result {
      Ok(Some(batch)) => PagerEvent::BatchAvailable(batch),
      Ok(None) => return,
      Err(e) => PagerEvent::Failed(e.to_string()),
    };
    // Receiver gone means the consumer has shut down
    let _ = tx.send(event);
  }
}

impl<S, F> Clone for Pager<S, F> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

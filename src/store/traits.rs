//! Record store contract consumed by the pager.

use crate::error::SyncError;
use crate::feed::AppRecord;

/// A keyed, ordered collection of app records.
///
/// Records are ordered ascending by the time they were first inserted, with
/// ties broken by insertion sequence. Updating an existing id never moves it.
pub trait RecordStore: Send + Sync {
  /// Read up to `limit` records starting at `offset`.
  ///
  /// A short or empty page means the store is exhausted; that is not an
  /// error.
  fn query_page(&self, offset: usize, limit: usize) -> Result<Vec<AppRecord>, SyncError>;

  /// Insert a record, or update the mutable fields of an existing one with
  /// the same id. `inserted_at` is assigned on insert and preserved on
  /// update. Records without an id are rejected.
  fn upsert(&self, record: &AppRecord) -> Result<(), SyncError>;

  /// Look up a single record by id.
  fn get(&self, id: &str) -> Result<Option<AppRecord>, SyncError>;

  /// Number of stored records.
  fn count(&self) -> Result<usize, SyncError>;
}

/// Store implementation that doesn't keep anything.
/// Used when caching is disabled - every page is empty, so the pager always
/// goes to the network.
pub struct NoopStore;

impl RecordStore for NoopStore {
  fn query_page(&self, _offset: usize, _limit: usize) -> Result<Vec<AppRecord>, SyncError> {
    Ok(Vec::new()) // Always exhausted
  }

  fn upsert(&self, _record: &AppRecord) -> Result<(), SyncError> {
    Ok(()) // Discard
  }

  fn get(&self, _id: &str) -> Result<Option<AppRecord>, SyncError> {
    Ok(None)
  }

  fn count(&self) -> Result<usize, SyncError> {
    Ok(0)
  }
}

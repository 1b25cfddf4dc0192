use std::ops::Range;

use crate::feed::AppRecord;

/// Where a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
  /// A page of the local store
  Cache,
  /// A feed fetch
  Network,
}

/// Records newly appended to the working set in one operation.
#[derive(Debug, Clone)]
pub struct Batch {
  /// Positions of the new records in the working set
  pub range: Range<usize>,
  pub records: Vec<AppRecord>,
  pub source: BatchSource,
}

impl Batch {
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }
}

/// Notifications delivered to a pager consumer
#[derive(Debug)]
pub enum PagerEvent {
  /// New records are visible
  BatchAvailable(Batch),
  /// A load or refresh failed; nothing changed
  Failed(String),
}

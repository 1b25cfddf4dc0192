use std::collections::HashSet;

use crate::event::{Batch, BatchSource};
use crate::feed::AppRecord;

/// The records currently visible to the consumer.
///
/// Append-only and unique by id. Records without an id never enter.
#[derive(Debug, Default)]
pub struct WorkingSet {
  records: Vec<AppRecord>,
  seen: HashSet<String>,
}

impl WorkingSet {
  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn get(&self, index: usize) -> Option<&AppRecord> {
    self.records.get(index)
  }

  pub fn records(&self) -> &[AppRecord] {
    &self.records
  }

  /// Append the records whose ids are not yet present, in order, and return
  /// the appended range as a batch. Duplicates within `incoming` are
  /// dropped too.
  pub fn append_unseen(&mut self, incoming: Vec<AppRecord>, source: BatchSource) -> Batch {
    let start = self.records.len();

    for record in incoming {
      if record.has_id() && self.seen.insert(record.id.clone()) {
        self.records.push(record);
      }
    }

    let end = self.records.len();
    Batch {
      range: start..end,
      records: self.records[start..end].to_vec(),
      source,
    }
  }
}

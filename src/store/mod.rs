//! Persisted record store backing the pager.
//!
//! - Keeps app records keyed by id, upserted in place
//! - Serves ordered pages by offset and limit
//! - Can be disabled entirely (`NoopStore`), leaving the network as the only
//!   source

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{NoopStore, RecordStore};

//! Browse a remote app feed through a local SQLite cache.
//!
//! The [`pager::Pager`] pages records out of a [`store::RecordStore`] and
//! falls back to a [`feed::FeedSource`] once the cache has nothing new.

pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod logging;
pub mod pager;
pub mod store;

pub use error::SyncError;
pub use event::{Batch, BatchSource, PagerEvent};
pub use pager::Pager;

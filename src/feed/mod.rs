//! Remote app feed: HTTP client, wire types and decoding into `AppRecord`.

mod api_types;
mod client;
mod decode;
mod types;

pub use client::{FeedSource, HttpFeedClient};
pub use decode::decode_feed;
pub use types::AppRecord;

//! Feed payload decoding.

use serde_json::Value;
use tracing::{debug, warn};

use super::api_types::{ApiEntry, ApiEnvelope};
use super::types::AppRecord;
use crate::error::SyncError;

/// Decode a raw feed payload into records, in feed order.
///
/// A payload that is not JSON, or whose envelope has the wrong shape, is a
/// `SyncError::Decode`. A missing `feed` or `results` yields no records.
/// Entries that fail to decode on their own are skipped.
pub fn decode_feed(payload: &[u8]) -> Result<Vec<AppRecord>, SyncError> {
  let value: Value = serde_json::from_slice(payload)?;

  // Derived structs also accept JSON arrays, so check the shape first
  let Value::Object(fields) = &value else {
    return Err(SyncError::Decode("payload is not a JSON object".to_string()));
  };
  if !matches!(fields.get("feed"), None | Some(Value::Null) | Some(Value::Object(_))) {
    return Err(SyncError::Decode("feed is not a JSON object".to_string()));
  }

  let envelope: ApiEnvelope = serde_json::from_value(value)?;

  let Some(feed) = envelope.feed else {
    debug!("Feed payload has no feed object");
    return Ok(Vec::new());
  };

  debug!(
    title = feed.title(),
    country = feed.country(),
    updated = feed.updated(),
    "Decoded feed envelope"
  );

  let entries = feed.results.unwrap_or_default();
  let total = entries.len();

  let records: Vec<AppRecord> = entries
    .into_iter()
    .enumerate()
    .filter_map(|(index, value)| match serde_json::from_value::<ApiEntry>(value) {
      Ok(entry) => Some(entry.into_record()),
      Err(e) => {
        warn!(index, error = %e, "Skipping malformed feed entry");
        None
      }
    })
    .collect();

  debug!(decoded = records.len(), total, "Decoded feed entries");
  Ok(records)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn payload(results: &str) -> Vec<u8> {
    format!(
      r#"{{"feed": {{"title": "Top Free Apps", "country": "in", "results": {}}}}}"#,
      results
    )
    .into_bytes()
  }

  #[test]
  fn test_missing_genres_is_empty() {
    let records = decode_feed(&payload(r#"[{"id": "1", "name": "Notes"}]"#)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name.as_deref(), Some("Notes"));
    assert!(records[0].genres.is_empty());
  }

  #[test]
  fn test_null_genres_is_empty() {
    let records = decode_feed(&payload(r#"[{"id": "1", "genres": null}]"#)).unwrap();
    assert!(records[0].genres.is_empty());
  }

  #[test]
  fn test_delimited_genres_are_split() {
    let records = decode_feed(&payload(r#"[{"id": "1", "genres": "Games, Action"}]"#)).unwrap();
    assert_eq!(records[0].genres, vec!["Games", "Action"]);
  }

  #[test]
  fn test_all_fields_mapped() {
    let records = decode_feed(&payload(
      r#"[{
        "artistName": "Acme",
        "id": "42",
        "name": "Rocket",
        "releaseDate": "2023-12-02",
        "kind": "apps",
        "artworkUrl100": "https://example.com/a.png",
        "genres": [{"genreId": "6014", "name": "Games", "url": "https://example.com/g"}],
        "url": "https://apps.example.com/42"
      }]"#,
    ))
    .unwrap();

    let app = &records[0];
    assert_eq!(app.id, "42");
    assert_eq!(app.artist_name.as_deref(), Some("Acme"));
    assert_eq!(app.release_date.as_deref(), Some("2023-12-02"));
    assert_eq!(app.artwork_url.as_deref(), Some("https://example.com/a.png"));
    assert_eq!(app.url.as_deref(), Some("https://apps.example.com/42"));
    assert_eq!(app.genres, vec!["Games"]);
    assert!(app.inserted_at.is_none());
  }

  #[test]
  fn test_missing_id_is_kept_empty() {
    let records = decode_feed(&payload(r#"[{"name": "Anonymous"}]"#)).unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].has_id());
  }

  #[test]
  fn test_malformed_entries_are_skipped() {
    let records = decode_feed(&payload(
      r#"[{"id": "1"}, 17, {"id": "2", "name": ["not", "a", "string"]}, {"id": "3"}]"#,
    ))
    .unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
  }

  #[test]
  fn test_order_is_preserved() {
    let records = decode_feed(&payload(r#"[{"id": "c"}, {"id": "a"}, {"id": "b"}]"#)).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
  }

  #[test]
  fn test_missing_feed_or_results_is_empty() {
    assert!(decode_feed(b"{}").unwrap().is_empty());
    assert!(decode_feed(br#"{"feed": {"title": "x"}}"#).unwrap().is_empty());
  }

  #[test]
  fn test_odd_metadata_does_not_fail() {
    let records =
      decode_feed(br#"{"feed": {"title": 7, "author": [], "results": [{"id": "1"}]}}"#).unwrap();
    assert_eq!(records.len(), 1);
  }

  #[test]
  fn test_malformed_payload_is_error() {
    assert!(matches!(decode_feed(b"<html>"), Err(SyncError::Decode(_))));
    assert!(matches!(decode_feed(b""), Err(SyncError::Decode(_))));
    assert!(matches!(
      decode_feed(br#"{"feed": {"results": "nope"}}"#),
      Err(SyncError::Decode(_))
    ));
    assert!(matches!(decode_feed(b"42"), Err(SyncError::Decode(_))));
  }

  #[test]
  fn test_array_payload_is_error() {
    assert!(matches!(decode_feed(b"[]"), Err(SyncError::Decode(_))));
    assert!(matches!(decode_feed(b"[null]"), Err(SyncError::Decode(_))));
    assert!(matches!(
      decode_feed(br#"[{"results": [{"id": "1"}]}]"#),
      Err(SyncError::Decode(_))
    ));
    assert!(matches!(
      decode_feed(br#"{"feed": [null, null, null, [{"id": "1"}]]}"#),
      Err(SyncError::Decode(_))
    ));
  }
}

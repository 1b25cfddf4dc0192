//! Serde-deserializable types matching the app feed JSON.
//!
//! These types are separate from `AppRecord` to allow lenient
//! deserialization while keeping the domain type focused on what the pager
//! needs.

use serde::Deserialize;
use serde_json::Value;

use super::types::AppRecord;

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiEnvelope {
  #[serde(default)]
  pub feed: Option<ApiFeed>,
}

/// Feed metadata plus the raw entries.
///
/// Metadata fields are kept as loose JSON values: they are only logged, so a
/// surprising shape there must not fail the decode.
#[derive(Debug, Deserialize, Default)]
pub struct ApiFeed {
  pub title: Option<Value>,
  pub country: Option<Value>,
  pub updated: Option<Value>,
  /// Entries are decoded one by one so a bad entry can be skipped
  #[serde(default)]
  pub results: Option<Vec<Value>>,
}

impl ApiFeed {
  pub fn title(&self) -> &str {
    self.title.as_ref().and_then(Value::as_str).unwrap_or("")
  }

  pub fn country(&self) -> &str {
    self.country.as_ref().and_then(Value::as_str).unwrap_or("")
  }

  pub fn updated(&self) -> &str {
    self.updated.as_ref().and_then(Value::as_str).unwrap_or("")
  }
}

// ============================================================================
// Entries
// ============================================================================

/// Identifiers are strings in the feed, but numeric ids are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiId {
  Text(String),
  Number(u64),
}

impl ApiId {
  fn into_string(self) -> String {
    match self {
      ApiId::Text(s) => s.trim().to_string(),
      ApiId::Number(n) => n.to_string(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiGenreObject {
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiGenre {
  Named(ApiGenreObject),
  Plain(String),
}

/// Genres arrive either as one delimited string or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiGenres {
  Joined(String),
  List(Vec<ApiGenre>),
}

impl ApiGenres {
  pub fn into_names(self) -> Vec<String> {
    match self {
      ApiGenres::Joined(s) => split_genres(&s),
      ApiGenres::List(items) => items
        .into_iter()
        .filter_map(|g| match g {
          ApiGenre::Named(obj) => obj.name,
          ApiGenre::Plain(name) => Some(name),
        })
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect(),
    }
  }
}

/// Split "A, B, C" into ordered genre names, dropping empty parts.
pub fn split_genres(joined: &str) -> Vec<String> {
  joined
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

#[derive(Debug, Deserialize)]
pub struct ApiEntry {
  pub id: Option<ApiId>,
  pub name: Option<String>,
  #[serde(rename = "artistName")]
  pub artist_name: Option<String>,
  #[serde(rename = "releaseDate")]
  pub release_date: Option<String>,
  #[serde(rename = "artworkUrl100")]
  pub artwork_url: Option<String>,
  pub url: Option<String>,
  pub genres: Option<ApiGenres>,
}

impl ApiEntry {
  pub fn into_record(self) -> AppRecord {
    AppRecord {
      id: self.id.map(ApiId::into_string).unwrap_or_default(),
      name: self.name,
      artist_name: self.artist_name,
      release_date: self.release_date,
      artwork_url: self.artwork_url,
      url: self.url,
      genres: self.genres.map(ApiGenres::into_names).unwrap_or_default(),
      inserted_at: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_split_genres_trims_and_drops_empty() {
    assert_eq!(split_genres(" Games ,Action,, "), vec!["Games", "Action"]);
    assert!(split_genres("").is_empty());
  }

  #[test]
  fn test_genre_objects_use_names() {
    let genres: ApiGenres = serde_json::from_str(
      r#"[{"genreId": "6014", "name": "Games"}, {"genreId": "7001"}, "Puzzle"]"#,
    )
    .unwrap();
    assert_eq!(genres.into_names(), vec!["Games", "Puzzle"]);
  }

  #[test]
  fn test_numeric_id_is_accepted() {
    let entry: ApiEntry = serde_json::from_str(r#"{"id": 1234, "name": "Calc"}"#).unwrap();
    let record = entry.into_record();
    assert_eq!(record.id, "1234");
    assert_eq!(record.name.as_deref(), Some("Calc"));
  }
}

use chrono::{DateTime, NaiveDate, Utc};

/// One listed application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppRecord {
  /// Stable feed identifier, empty when the feed entry carried none
  pub id: String,
  pub name: Option<String>,
  pub artist_name: Option<String>,
  pub release_date: Option<String>,
  pub artwork_url: Option<String>,
  /// Store page link
  pub url: Option<String>,
  pub genres: Vec<String>,
  /// Assigned by the store on first insert
  pub inserted_at: Option<DateTime<Utc>>,
}

impl AppRecord {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..Self::default()
    }
  }

  /// Whether this record can be keyed in the store or the working set.
  pub fn has_id(&self) -> bool {
    !self.id.is_empty()
  }

  /// Release date as "December 2, 2023", or "Invalid Date".
  pub fn formatted_release_date(&self) -> String {
    self
      .release_date
      .as_deref()
      .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
      .map(|d| d.format("%B %-d, %Y").to_string())
      .unwrap_or_else(|| "Invalid Date".to_string())
  }

  pub fn genre_line(&self) -> String {
    self.genres.join(", ")
  }
}

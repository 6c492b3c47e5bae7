//! Serde-deserializable types matching the character API responses.
//!
//! These are used directly as domain types: the application is read-only and
//! never reshapes what the remote sends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Life status of a character.
///
/// The API documents `Alive`, `Dead` and `unknown`. Anything else is read as
/// `Unknown` so presentation never has to handle an unmapped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterStatus {
  Alive,
  Dead,
  #[default]
  Unknown,
}

impl CharacterStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      CharacterStatus::Alive => "Alive",
      CharacterStatus::Dead => "Dead",
      CharacterStatus::Unknown => "unknown",
    }
  }
}

impl From<&str> for CharacterStatus {
  fn from(value: &str) -> Self {
    match value {
      "Alive" => CharacterStatus::Alive,
      "Dead" => CharacterStatus::Dead,
      _ => CharacterStatus::Unknown,
    }
  }
}

impl<'de> Deserialize<'de> for CharacterStatus {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    Ok(CharacterStatus::from(raw.as_str()))
  }
}

/// Named reference to a location resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationRef {
  pub name: String,
  #[serde(default)]
  pub url: String,
}

/// A character as returned by both the list and the single-entity endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Character {
  pub id: u32,
  pub name: String,
  pub status: CharacterStatus,
  pub species: String,
  /// Subspecies or type; the API sends an empty string when there is none
  #[serde(rename = "type", default, deserialize_with = "empty_string_as_none")]
  pub kind: Option<String>,
  pub gender: String,
  pub origin: LocationRef,
  pub location: LocationRef,
  pub image: String,
  #[serde(default)]
  pub episode: Vec<String>,
  pub url: String,
  pub created: DateTime<Utc>,
}

/// Pagination metadata echoed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageInfo {
  /// Total number of characters across all pages
  pub count: u32,
  /// Total number of pages
  pub pages: u32,
  pub next: Option<String>,
  pub prev: Option<String>,
}

/// One page of characters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
  pub info: PageInfo,
  pub results: Vec<Character>,
}

impl Page {
  pub fn has_next(&self) -> bool {
    self.info.next.is_some()
  }

  pub fn has_prev(&self) -> bool {
    self.info.prev.is_some()
  }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value: Option<String> = Option::deserialize(deserializer)?;
  Ok(value.filter(|s| !s.trim().is_empty()))
}

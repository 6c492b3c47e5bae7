//! Query keys for character API calls.

use crate::cache::QueryKey;

/// Identity of a cached API call: the operation plus its parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiQueryKey {
  /// One page of the character list
  CharactersPage { page: u32 },
  /// A single character by id
  Character { id: String },
}

impl QueryKey for ApiQueryKey {
  fn description(&self) -> String {
    match self {
      Self::CharactersPage { page } => format!("characters page {}", page),
      Self::Character { id } => format!("character {}", id),
    }
  }
}

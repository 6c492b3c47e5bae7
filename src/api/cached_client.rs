//! Cached API client that routes every call through the query cache.

use color_eyre::{eyre::eyre, Result};
use url::Url;

use crate::cache::{fetcher, QueryCache, QueryConfig};
use crate::config::Config;
use crate::query::Query;

use super::cache::ApiQueryKey;
use super::client::ApiClient;
use super::error::ApiError;
use super::types::{Character, Page};

pub type PageQuery = Query<ApiQueryKey, Page, ApiError>;
pub type CharacterQuery = Query<ApiQueryKey, Character, ApiError>;

/// Character API client with transparent caching.
///
/// This is the explicitly constructed store handed to every view. Clones share
/// the same caches, so two views asking for the same key share one entry.
#[derive(Clone)]
pub struct CachedApiClient {
  inner: ApiClient,
  pages: QueryCache<ApiQueryKey, Page, ApiError>,
  characters: QueryCache<ApiQueryKey, Character, ApiError>,
}

impl CachedApiClient {
  /// Create a new cached client from configuration.
  pub fn new(config: &Config) -> Result<Self> {
    let inner =
      ApiClient::new(&config.api).map_err(|e| eyre!("Failed to create API client: {}", e))?;
    Ok(Self::with_client(inner, config.query.to_query_config()))
  }

  pub fn with_client(inner: ApiClient, query_config: QueryConfig) -> Self {
    Self {
      inner,
      pages: QueryCache::new(query_config),
      characters: QueryCache::new(query_config),
    }
  }

  pub fn base_url(&self) -> &Url {
    self.inner.base_url()
  }

  pub fn query_config(&self) -> QueryConfig {
    self.pages.config()
  }

  /// Observe one page of characters.
  pub fn characters_page(&self, page: u32) -> PageQuery {
    let inner = self.inner.clone();
    self.pages.query(
      ApiQueryKey::CharactersPage { page },
      fetcher(move || {
        let inner = inner.clone();
        async move { inner.fetch_character_page(page).await }
      }),
    )
  }

  /// Observe a single character.
  pub fn character(&self, id: &str) -> CharacterQuery {
    let inner = self.inner.clone();
    let id = id.to_string();
    self.characters.query(
      ApiQueryKey::Character { id: id.clone() },
      fetcher(move || {
        let inner = inner.clone();
        let id = id.clone();
        async move { inner.fetch_character(&id).await }
      }),
    )
  }
}

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use crate::api::error::{ApiError, Result};
use crate::api::types::{Character, Page};
use crate::config::ApiConfig;

/// HTTP client for the character API
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = parse_base_url(&config.base_url)?;

    let mut builder =
      reqwest::Client::builder().user_agent(concat!("rmtui/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder.build()?;

    Ok(Self { http, base_url })
  }

  /// Create a client against a custom base URL (for testing with wiremock).
  #[cfg(test)]
  pub fn with_base_url(base_url: &str) -> Result<Self> {
    Self::new(&ApiConfig {
      base_url: base_url.to_string(),
      ..ApiConfig::default()
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Fetch one page of characters (`GET {base}/character?page={page}`)
  pub async fn fetch_character_page(&self, page: u32) -> Result<Page> {
    let mut url = self.endpoint(&["character"])?;
    url
      .query_pairs_mut()
      .append_pair("page", &page.to_string());

    self.get_json(url, "characters").await
  }

  /// Fetch a single character by id (`GET {base}/character/{id}`)
  pub async fn fetch_character(&self, id: &str) -> Result<Character> {
    let url = self.endpoint(&["character", id])?;
    self.get_json(url, "character").await
  }

  /// Append path segments to the base URL, percent-encoding each one.
  fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ApiError::InvalidUrl {
        url: self.base_url.to_string(),
        reason: "cannot be a base".to_string(),
      })?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &'static str) -> Result<T> {
    let started = Instant::now();
    let response = self.http.get(url.clone()).send().await?;
    let status = response.status();

    debug!(
      url = %url,
      status = status.as_u16(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "GET"
    );

    if status == StatusCode::NOT_FOUND {
      return Err(ApiError::NotFound { resource });
    }
    if !status.is_success() {
      return Err(ApiError::RemoteRequest {
        resource,
        status: status.as_u16(),
        status_text: status
          .canonical_reason()
          .unwrap_or("Unknown Status")
          .to_string(),
      });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| ApiError::Parse { resource, source })
  }
}

fn parse_base_url(raw: &str) -> Result<Url> {
  let url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl {
    url: raw.to_string(),
    reason: e.to_string(),
  })?;
  if url.cannot_be_a_base() {
    return Err(ApiError::InvalidUrl {
      url: raw.to_string(),
      reason: "cannot be a base".to_string(),
    });
  }
  Ok(url)
}

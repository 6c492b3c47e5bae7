//! Navigable application state.
//!
//! Every view corresponds to a route that can be written out as a path and
//! parsed back, so a location can be restored with `--route` or `:open`.

use color_eyre::{eyre::eyre, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;
use url::Url;

/// A location in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  /// `/?page={page}`
  CharacterList { page: u32 },
  /// `/character/{id}`
  CharacterDetail { id: String },
}

/// Characters escaped in an id so it stays a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'/')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'\\')
  .add(b'`')
  .add(b'{')
  .add(b'}');

impl Default for Route {
  fn default() -> Self {
    Route::CharacterList { page: 1 }
  }
}

impl Route {
  /// Parse a route path such as `/?page=3` or `/character/42`.
  pub fn parse(input: &str) -> Result<Self> {
    let input = input.trim();
    let input = if input.starts_with('/') {
      input.to_string()
    } else {
      format!("/{}", input)
    };

    // Resolve against a dummy origin so `url` handles path and query splitting
    let url = Url::parse("http://rmtui.local")
      .and_then(|base| base.join(&input))
      .map_err(|e| eyre!("Invalid route {}: {}", input, e))?;

    let segments: Vec<&str> = url
      .path_segments()
      .map(|s| s.filter(|seg| !seg.is_empty()).collect())
      .unwrap_or_default();

    match segments.as_slice() {
      [] => {
        let page = url
          .query_pairs()
          .find(|(k, _)| k == "page")
          .map(|(_, v)| v.into_owned());
        Ok(Route::CharacterList {
          page: normalize_page(page.as_deref()),
        })
      }
      ["character", id] => {
        let id = percent_decode_str(id)
          .decode_utf8()
          .map_err(|e| eyre!("Invalid character id in {}: {}", input, e))?;
        Ok(Route::CharacterDetail { id: id.into_owned() })
      }
      _ => Err(eyre!("Unknown route: {}", input)),
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Route::CharacterList { page } => write!(f, "/?page={}", page),
      Route::CharacterDetail { id } => {
        write!(f, "/character/{}", utf8_percent_encode(id, SEGMENT))
      }
    }
  }
}

/// Turn a raw `page` parameter into a valid page number.
///
/// Anything that is not a positive integer (absent, zero, negative,
/// fractional, non-numeric) becomes page 1.
pub fn normalize_page(raw: Option<&str>) -> u32 {
  raw
    .and_then(|s| s.trim().parse::<u32>().ok())
    .filter(|&page| page > 0)
    .unwrap_or(1)
}

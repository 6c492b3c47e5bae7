//! Generic in-memory query cache.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Indexes results by a typed query key
//! - Collapses concurrent requests for the same key into one fetch
//! - Serves stale data immediately while refetching in the background
//! - Broadcasts entry changes to every observer of a key

mod layer;
mod traits;

pub use layer::{fetcher, Fetcher, QueryCache, RefetchHandle};
pub use traits::{QueryConfig, QueryKey, QuerySnapshot};

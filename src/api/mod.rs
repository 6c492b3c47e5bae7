pub mod cache;
pub mod cached_client;
pub mod client;
pub mod error;
pub mod types;

pub use cached_client::{CachedApiClient, CharacterQuery, PageQuery};

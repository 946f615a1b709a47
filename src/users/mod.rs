//! The user directory: wire types, HTTP client, and cached client.

mod api_types;
mod cached_client;
mod client;
mod types;

pub use cached_client::CachedUserClient;
pub use client::{FetchError, UserClient};
pub use types::User;

use serde::{Deserialize, Serialize};

/// A user record as displayed in the directory table.
///
/// Immutable once fetched; the cache layer replaces the whole list on
/// refetch. Serde derives are for cache-storage encoding, not the wire
/// format (see `api_types`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub name: String,
  pub username: String,
  pub email: String,
  pub website: String,
}

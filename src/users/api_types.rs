//! Wire types for the user-listing endpoint.

use serde::Deserialize;

use super::types::User;

/// A user object as returned by the remote API.
///
/// Every field defaults when absent and unknown fields are ignored, so
/// records pass through without per-field validation. Only the overall
/// array shape is checked (in `client`).
#[derive(Debug, Default, Deserialize)]
pub struct ApiUser {
  #[serde(default)]
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub website: String,
}

impl ApiUser {
  pub fn into_user(self) -> User {
    User {
      id: self.id,
      name: self.name,
      username: self.username,
      email: self.email,
      website: self.website,
    }
  }
}

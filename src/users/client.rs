use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::users::api_types::ApiUser;
use crate::users::types::User;

/// Errors from fetching the user list.
///
/// All three variants carry a human-readable message via `Display`;
/// nothing above the client needs to distinguish them beyond that.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  /// The request failed to complete (DNS, connect, timeout, body read)
  #[error("request failed: {0}")]
  Network(#[from] reqwest::Error),
  /// The server answered with a non-success status
  #[error("server returned HTTP {0}")]
  HttpStatus(StatusCode),
  /// The payload was not the expected JSON array of users
  #[error("invalid response format: {0}")]
  Format(&'static str),
}

/// HTTP client for the user-listing endpoint
#[derive(Clone)]
pub struct UserClient {
  http: reqwest::Client,
  endpoint: Url,
}

impl UserClient {
  pub fn new(config: &Config) -> color_eyre::Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .user_agent(concat!("udir/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      endpoint: config.api.url.clone(),
    })
  }

  /// Fetch the full user list.
  ///
  /// One GET request; non-2xx statuses and malformed payloads are
  /// normalized into `FetchError` alongside transport failures.
  pub async fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
    let response = self
      .http
      .get(self.endpoint.clone())
      .header(ACCEPT, "application/json")
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::HttpStatus(status));
    }

    let body = response.text().await?;
    parse_users(&body)
  }
}

/// Decode a response body into user records.
///
/// The only structural validation is that the payload is a JSON array;
/// elements map leniently (missing fields default, extras ignored).
pub fn parse_users(body: &str) -> Result<Vec<User>, FetchError> {
  let payload: serde_json::Value =
    serde_json::from_str(body).map_err(|_| FetchError::Format("payload is not valid JSON"))?;

  if !payload.is_array() {
    return Err(FetchError::Format("payload is not an array"));
  }

  let api_users: Vec<ApiUser> = serde_json::from_value(payload)
    .map_err(|_| FetchError::Format("array element is not a user object"))?;

  Ok(api_users.into_iter().map(ApiUser::into_user).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_valid_payload() {
    let body = r#"[
      {"id": 1, "name": "Leanne Graham", "username": "Bret",
       "email": "Sincere@april.biz", "website": "hildegard.org",
       "address": {"city": "Gwenborough"}, "phone": "1-770-736-8031"},
      {"id": 2, "name": "Ervin Howell", "username": "Antonette",
       "email": "Shanna@melissa.tv", "website": "anastasia.net"}
    ]"#;

    let users = parse_users(body).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, 1);
    assert_eq!(users[0].name, "Leanne Graham");
    assert_eq!(users[1].website, "anastasia.net");
  }

  #[test]
  fn test_parse_ignores_missing_fields() {
    let body = r#"[{"id": 7, "name": "No Mail"}]"#;

    let users = parse_users(body).unwrap();
    assert_eq!(users[0].id, 7);
    assert_eq!(users[0].email, "");
    assert_eq!(users[0].website, "");
  }

  #[test]
  fn test_parse_rejects_non_array() {
    let body = r#"{"users": []}"#;

    let err = parse_users(body).unwrap_err();
    assert!(matches!(err, FetchError::Format(_)));
    assert_eq!(err.to_string(), "invalid response format: payload is not an array");
  }

  #[test]
  fn test_parse_rejects_invalid_json() {
    let err = parse_users("not json").unwrap_err();
    assert!(matches!(err, FetchError::Format(_)));
  }

  #[test]
  fn test_parse_empty_array() {
    assert!(parse_users("[]").unwrap().is_empty());
  }

  #[test]
  fn test_status_error_message() {
    let err = FetchError::HttpStatus(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "server returned HTTP 500 Internal Server Error");
  }
}

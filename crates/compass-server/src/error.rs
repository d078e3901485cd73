//! Auth error type and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("No authorization header provided")]
  MissingToken,

  #[error("invalid token: {0}")]
  InvalidToken(#[source] jsonwebtoken::errors::Error),

  /// Only raised while auth is disabled, where tokens are decoded unverified.
  #[error("malformed token: {0}")]
  MalformedToken(#[source] jsonwebtoken::errors::Error),

  #[error("Token has no access to {0}")]
  MissingScope(String),

  #[error("no public key loaded")]
  KeyUnavailable,

  #[error("auth is enabled but auth.endpoint is not set")]
  MissingEndpoint,

  #[error("could not retrieve public key from the auth server: {0}")]
  KeyFetch(#[from] reqwest::Error),

  #[error("auth server returned an unusable public key: {0}")]
  InvalidKey(#[source] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
  fn into_response(self) -> Response {
    let status = match &self {
      AuthError::MalformedToken(_) => StatusCode::BAD_REQUEST,
      AuthError::MissingEndpoint | AuthError::KeyFetch(_) | AuthError::InvalidKey(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      _ => StatusCode::UNAUTHORIZED,
    };
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

//! HTTP server wiring for the compass quiz backend.
//!
//! Wraps the [`compass_api`] router with bearer-token authorization,
//! request tracing, permissive CORS, and an optional static frontend.

pub mod auth;
pub mod error;

pub use error::AuthError;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, middleware};
use compass_api::CompassStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use auth::{AuthService, require_scope};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `compass.toml` and
/// `COMPASS__*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_database_path")]
  pub database_path: PathBuf,
  /// Served for every path the API does not claim.
  #[serde(default)]
  pub static_dir:    Option<PathBuf>,
  #[serde(default)]
  pub auth:          AuthSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
  #[serde(default)]
  pub disable:                bool,
  /// Base URL of the OAuth server.
  #[serde(default)]
  pub endpoint:               Option<String>,
  /// `0` turns periodic refresh off.
  #[serde(default = "default_fetch_interval")]
  pub fetch_interval_minutes: u64,
}

impl Default for AuthSettings {
  fn default() -> Self {
    Self {
      disable:                false,
      endpoint:               None,
      fetch_interval_minutes: default_fetch_interval(),
    }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3000 }

fn default_database_path() -> PathBuf { PathBuf::from("compass.db") }

fn default_fetch_interval() -> u64 { 30 }

impl ServerConfig {
  /// Read `path` if it exists, then overlay the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("COMPASS")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S: CompassStore>(
  store: Arc<S>,
  auth: Arc<AuthService>,
  static_dir: Option<&Path>,
) -> Router {
  let mut app = compass_api::api_router(store)
    .route_layer(middleware::from_fn_with_state(auth, require_scope));
  if let Some(dir) = static_dir {
    app = app.fallback_service(ServeDir::new(dir));
  }
  app
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use compass_store_sqlite::SqliteStore;
  use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, encode};
  use serde_json::json;
  use tower::ServiceExt as _;

  use super::*;

  const SECRET: &[u8] = b"router-secret";

  async fn app(auth: AuthService) -> Router {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    router(Arc::new(store), Arc::new(auth), None)
  }

  fn token(scope: &[&str]) -> String {
    encode(
      &Header::new(Algorithm::HS256),
      &json!({ "userId": "admin", "scope": scope }),
      &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
  }

  fn enforcing() -> AuthService {
    AuthService::with_key(DecodingKey::from_secret(SECRET), Algorithm::HS256)
  }

  async fn status(app: &Router, method: &str, uri: &str, bearer: Option<String>) -> StatusCode {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = if method == "POST" {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(r#"[{"name":"S"}]"#)
    } else {
      Body::empty()
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap().status()
  }

  #[tokio::test]
  async fn public_routes_need_no_token() {
    let app = app(enforcing()).await;
    assert_eq!(status(&app, "GET", "/questions", None).await, StatusCode::OK);
    assert_eq!(status(&app, "GET", "/parties", None).await, StatusCode::OK);
    assert_eq!(status(&app, "GET", "/answers", None).await, StatusCode::OK);
  }

  #[tokio::test]
  async fn protected_routes_need_scopes() {
    let app = app(enforcing()).await;
    assert_eq!(status(&app, "GET", "/sources", None).await, StatusCode::UNAUTHORIZED);
    assert_eq!(
      status(&app, "GET", "/sources", Some(token(&["sources"]))).await,
      StatusCode::OK
    );
    assert_eq!(
      status(&app, "POST", "/sources", Some(token(&["sources"]))).await,
      StatusCode::UNAUTHORIZED
    );
    assert_eq!(
      status(&app, "POST", "/sources", Some(token(&["sources", "sources.create"]))).await,
      StatusCode::CREATED
    );
    assert_eq!(
      status(&app, "GET", "/results", Some(token(&["sources"]))).await,
      StatusCode::UNAUTHORIZED
    );
  }

  #[tokio::test]
  async fn disabled_auth_lets_everything_through() {
    let app = app(AuthService::disabled()).await;
    assert_eq!(status(&app, "GET", "/sources", None).await, StatusCode::OK);
    assert_eq!(status(&app, "POST", "/sources", None).await, StatusCode::CREATED);
    assert_eq!(
      status(&app, "GET", "/sources", Some("garbage".into())).await,
      StatusCode::BAD_REQUEST
    );
  }

  #[tokio::test]
  async fn unknown_paths_are_not_guarded() {
    let app = app(enforcing()).await;
    assert_eq!(status(&app, "GET", "/nowhere", None).await, StatusCode::NOT_FOUND);
  }

  #[test]
  fn missing_config_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/compass.toml")).unwrap();
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.database_path, PathBuf::from("compass.db"));
    assert_eq!(cfg.auth.fetch_interval_minutes, 30);
    assert!(cfg.static_dir.is_none());
  }

  #[test]
  fn config_file_overrides_defaults() {
    let path = std::env::temp_dir().join(format!("compass-{}.toml", std::process::id()));
    std::fs::write(
      &path,
      "port = 8080\nstatic_dir = \"web\"\n\n[auth]\ndisable = true\n",
    )
    .unwrap();
    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.static_dir, Some(PathBuf::from("web")));
    assert!(cfg.auth.disable);
    assert_eq!(cfg.auth.fetch_interval_minutes, 30);
  }
}

//! Assembly of the Aula HTTP service.
//!
//! Combines the health check and the JSON API into one router, and owns the
//! start-up chores that run before serving: the bootstrap administrator and
//! the optional demo data set.

pub mod seed;

use std::path::PathBuf;

use axum::{Router, routing::get};
use aula_api::{AppState, api_router, health};
use aula_core::{
  access::Role,
  people::NewUser,
  store::AcademicStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AULA_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// Administrator account created on start-up when its username is free.
  #[serde(default)]
  pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Deserialize, Clone)]
pub struct BootstrapAdmin {
  pub username:      String,
  /// Argon2 PHC string, as printed by `--hash-password`.
  pub password_hash: String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  #[serde(default)]
  pub dni:           Option<String>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router: `/health/` plus the API under
/// `/api`, wrapped in request tracing.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: AcademicStore + 'static,
{
  Router::new()
    .route("/health/", get(health::handler::<S>))
    .with_state(state.clone())
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Bootstrap ────────────────────────────────────────────────────────────────

/// Create the configured administrator unless a user with that username
/// already exists. Returns whether an account was created.
pub async fn ensure_admin<S: AcademicStore>(
  store: &S,
  admin: &BootstrapAdmin,
) -> Result<bool, aula_core::Error> {
  if store
    .find_credentials(&admin.username)
    .await
    .map_err(Into::into)?
    .is_some()
  {
    tracing::debug!(username = %admin.username, "bootstrap administrator already present");
    return Ok(false);
  }
  let user = store
    .create_user(NewUser {
      username:      admin.username.clone(),
      first_name:    admin.first_name.clone(),
      last_name:     admin.last_name.clone(),
      email:         admin.email.clone(),
      dni:           admin.dni.clone(),
      role:          Role::Administrator,
      password_hash: admin.password_hash.clone(),
    })
    .await
    .map_err(Into::into)?;
  tracing::info!(user_id = %user.user_id, username = %user.username, "created bootstrap administrator");
  Ok(true)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use aula_api::password::{Argon2Params, hash_password_with_params};
  use aula_store_sqlite::SqliteStore;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    AppState {
      store:           Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      password_params: Argon2Params::insecure_fast(),
    }
  }

  fn admin_config(password: &str) -> BootstrapAdmin {
    BootstrapAdmin {
      username:      "root".into(),
      password_hash: hash_password_with_params(password, Argon2Params::insecure_fast())
        .unwrap(),
      first_name:    "Ada".into(),
      last_name:     "Admin".into(),
      email:         "root@example.edu".into(),
      dni:           None,
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot_raw(
    state: AppState<SqliteStore>,
    uri: &str,
    auth: Option<String>,
  ) -> (StatusCode, serde_json::Value) {
    let mut req = Request::builder().uri(uri);
    if let Some(auth) = auth {
      req = req.header(header::AUTHORIZATION, auth);
    }
    let resp = app(state)
      .oneshot(req.body(Body::empty()).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn health_reports_connected_database() {
    let (status, body) = oneshot_raw(make_state().await, "/health/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
  }

  #[tokio::test]
  async fn api_is_nested_and_authenticated() {
    let (status, body) = oneshot_raw(make_state().await, "/api/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn bootstrap_admin_can_log_in() {
    let state = make_state().await;
    let admin = admin_config("s3cret");
    assert!(ensure_admin(state.store.as_ref(), &admin).await.unwrap());

    let (status, body) = oneshot_raw(
      state,
      "/api/dashboard/admin",
      Some(auth_header("root", "s3cret")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["faculties"], 0);
  }

  #[tokio::test]
  async fn bootstrap_admin_is_created_once() {
    let state = make_state().await;
    let admin = admin_config("s3cret");
    assert!(ensure_admin(state.store.as_ref(), &admin).await.unwrap());
    assert!(!ensure_admin(state.store.as_ref(), &admin).await.unwrap());
    let admins = state
      .store
      .list_users(Some(Role::Administrator))
      .await
      .unwrap();
    assert_eq!(admins.len(), 1);
  }

  #[tokio::test]
  async fn seeded_student_sees_grades() {
    let state = make_state().await;
    let report = seed::load_demo(state.store.as_ref(), Argon2Params::insecure_fast())
      .await
      .unwrap();
    assert!(report.is_some());

    let (status, body) = oneshot_raw(
      state,
      "/api/dashboard/student",
      Some(auth_header("lucia", seed::DEMO_PASSWORD)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student"]["student_id"], "S-1001");
    assert!(!body["grades"].as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn seeding_twice_is_a_no_op() {
    let state = make_state().await;
    let store = state.store.as_ref();
    let params = Argon2Params::insecure_fast();
    assert!(seed::load_demo(store, params).await.unwrap().is_some());
    assert!(seed::load_demo(store, params).await.unwrap().is_none());
  }
}

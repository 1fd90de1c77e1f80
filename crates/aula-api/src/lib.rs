//! JSON REST API for Aula.
//!
//! Exposes an axum [`Router`] backed by any [`AcademicStore`]. Every route
//! authenticates with HTTP Basic against the store's users; TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new()
//!   .route("/health/", get(aula_api::health::handler::<S>))
//!   .with_state(state.clone())
//!   .nest("/api", aula_api::api_router(state))
//! ```

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod enrollments;
pub mod error;
pub mod extract;
pub mod grades;
pub mod health;
pub mod password;
pub mod people;
pub mod scope;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use aula_core::store::AcademicStore;

pub use auth::CurrentUser;
pub use error::ApiError;
use password::Argon2Params;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:           Arc<S>,
  /// Cost parameters for hashing passwords of newly created users.
  pub password_params: Argon2Params,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, password_params: Argon2Params::default() }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      password_params: self.password_params,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: AcademicStore + 'static,
{
  Router::new()
    .route("/me", get(people::me))
    // Catalog
    .route(
      "/faculties",
      get(catalog::list_faculties::<S>).post(catalog::create_faculty::<S>),
    )
    .route(
      "/faculties/{code}",
      get(catalog::get_faculty::<S>)
        .put(catalog::update_faculty::<S>)
        .delete(catalog::delete_faculty::<S>),
    )
    .route(
      "/careers",
      get(catalog::list_careers::<S>).post(catalog::create_career::<S>),
    )
    .route(
      "/careers/{code}",
      get(catalog::get_career::<S>)
        .put(catalog::update_career::<S>)
        .delete(catalog::delete_career::<S>),
    )
    .route(
      "/subjects",
      get(catalog::list_subjects::<S>).post(catalog::create_subject::<S>),
    )
    .route(
      "/subjects/{code}",
      get(catalog::get_subject::<S>)
        .put(catalog::update_subject::<S>)
        .delete(catalog::delete_subject::<S>),
    )
    .route("/subjects/{code}/professors", put(people::assign_subject::<S>))
    .route(
      "/finals",
      get(catalog::list_final_exams::<S>).post(catalog::create_final_exam::<S>),
    )
    .route(
      "/finals/{id}",
      get(catalog::get_final_exam::<S>)
        .put(catalog::update_final_exam::<S>)
        .delete(catalog::delete_final_exam::<S>),
    )
    .route("/finals/{id}/professors", put(people::assign_final_exam::<S>))
    .route("/finals/{id}/enrollments", get(enrollments::final_exam_roster::<S>))
    // People
    .route(
      "/users",
      get(people::list_users::<S>).post(people::create_user::<S>),
    )
    .route(
      "/users/{id}",
      get(people::get_user::<S>).put(people::update_user::<S>),
    )
    .route("/users/{id}/active", put(people::set_active::<S>))
    .route(
      "/students",
      get(people::list_students::<S>).post(people::create_student::<S>),
    )
    .route("/students/{id}", get(people::get_student::<S>))
    .route(
      "/professors",
      get(people::list_professors::<S>).post(people::create_professor::<S>),
    )
    .route("/professors/{id}", get(people::get_professor::<S>))
    // Enrollments
    .route("/enrollments", get(enrollments::list_own::<S>))
    .route("/enrollments/subjects/{code}", post(enrollments::enroll_subject::<S>))
    .route("/enrollments/finals/{id}", post(enrollments::enroll_final_exam::<S>))
    // Grades
    .route("/grades/{subject}", get(grades::list_for_subject::<S>))
    .route("/grades/{subject}/{student}", put(grades::update::<S>))
    .route(
      "/grades/{subject}/{student}/final-score",
      put(grades::set_final_score::<S>),
    )
    // Dashboards
    .route("/dashboard/student", get(dashboard::student::<S>))
    .route("/dashboard/professor", get(dashboard::professor::<S>))
    .route("/dashboard/admin", get(dashboard::admin::<S>))
    .route(
      "/dashboard/student/certificate",
      get(dashboard::certificate::<S>),
    )
    .with_state(state)
}

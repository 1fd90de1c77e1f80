//! Handlers for enrollments.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/enrollments` | the current student's enrollments |
//! | `POST` | `/enrollments/subjects/{code}` | student enrolls in a subject |
//! | `POST` | `/enrollments/finals/{id}` | student enrolls in a final exam |
//! | `GET`  | `/finals/{id}/enrollments` | roster, assigned professors only |

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;

use aula_core::{
  access::Operation,
  enrollment::{Enrollment, Offering},
  store::AcademicStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{ApiError, store_err},
  extract::Json,
  scope,
};

/// `GET /enrollments`
pub async fn list_own<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  user.authorize(Operation::Enroll)?;
  let student = scope::student_profile(state.store.as_ref(), &user).await?;
  let enrollments = state
    .store
    .list_enrollments_for_student(&student.student_id)
    .await
    .map_err(store_err)?;
  Ok(Json(enrollments))
}

async fn enroll<S: AcademicStore>(
  state: &AppState<S>,
  user: &CurrentUser,
  offering: Offering,
) -> Result<Enrollment, ApiError> {
  user.authorize(Operation::Enroll)?;
  let student = scope::student_profile(state.store.as_ref(), user).await?;
  state
    .store
    .enroll(student.student_id, offering)
    .await
    .map_err(store_err)
}

/// `POST /enrollments/subjects/{code}`
pub async fn enroll_subject<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let enrollment = enroll(&state, &user, Offering::subject(code)).await?;
  Ok((StatusCode::CREATED, Json(enrollment)))
}

/// `POST /enrollments/finals/{id}`
pub async fn enroll_final_exam<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let enrollment = enroll(&state, &user, Offering::final_exam(id)).await?;
  Ok((StatusCode::CREATED, Json(enrollment)))
}

/// `GET /finals/{id}/enrollments`
pub async fn final_exam_roster<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  user.authorize(Operation::ViewFinalExamRoster)?;
  let store = state.store.as_ref();
  let professor = scope::professor_profile(store, &user).await?;
  scope::require_final_exam_assignment(store, &professor, id).await?;
  let roster = store
    .list_enrollments_for_offering(&Offering::final_exam(id))
    .await
    .map_err(store_err)?;
  Ok(Json(roster))
}

//! Handlers for the grade ledger. Professors only, and only for subjects they
//! are assigned to.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/grades/{subject}` | creates missing placeholders before answering |
//! | `PUT`  | `/grades/{subject}/{student}` | body: `{"promotion_score":…,"final_score":…,"notes":…}` |
//! | `PUT`  | `/grades/{subject}/{student}/final-score` | body: `{"final_score":7.5}` or `null` |

use axum::extract::{Path, State};
use serde::Deserialize;

use aula_core::{
  access::Operation,
  grade::{Grade, GradeUpdate, Score},
  store::AcademicStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{ApiError, store_err},
  extract::Json,
  scope,
};

/// `GET /grades/{subject}`
pub async fn list_for_subject<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(subject): Path<String>,
) -> Result<Json<Vec<Grade>>, ApiError> {
  user.authorize(Operation::ViewGrades)?;
  let store = state.store.as_ref();
  let professor = scope::professor_profile(store, &user).await?;
  scope::require_subject_assignment(store, &professor, &subject).await?;
  let grades = store
    .get_grades_for_subject(&subject)
    .await
    .map_err(store_err)?;
  Ok(Json(grades))
}

/// The grade form as submitted. Scores are range-checked by
/// [`GradeForm::into_update`] so a bad value is a form error, not a body
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct GradeForm {
  pub promotion_score: Option<f64>,
  pub final_score:     Option<f64>,
  pub notes:           Option<String>,
}

impl GradeForm {
  pub fn into_update(self) -> Result<GradeUpdate, ApiError> {
    Ok(GradeUpdate {
      promotion_score: Score::new_optional(self.promotion_score)?,
      final_score:     Score::new_optional(self.final_score)?,
      notes:           self.notes,
    })
  }
}

/// `PUT /grades/{subject}/{student}`
pub async fn update<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path((subject, student)): Path<(String, String)>,
  Json(body): Json<GradeForm>,
) -> Result<Json<Grade>, ApiError> {
  user.authorize(Operation::EditGrades)?;
  let store = state.store.as_ref();
  let professor = scope::professor_profile(store, &user).await?;
  scope::require_subject_assignment(store, &professor, &subject).await?;
  let update = body.into_update()?;
  let grade = store
    .update_grade(student, subject, update)
    .await
    .map_err(store_err)?;
  Ok(Json(grade))
}

#[derive(Debug, Deserialize)]
pub struct FinalScoreBody {
  pub final_score: Option<f64>,
}

/// `PUT /grades/{subject}/{student}/final-score`
pub async fn set_final_score<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path((subject, student)): Path<(String, String)>,
  Json(body): Json<FinalScoreBody>,
) -> Result<Json<Grade>, ApiError> {
  user.authorize(Operation::EditGrades)?;
  let store = state.store.as_ref();
  let professor = scope::professor_profile(store, &user).await?;
  scope::require_subject_assignment(store, &professor, &subject).await?;
  let grade = store
    .set_final_score(student, subject, body.final_score)
    .await
    .map_err(store_err)?;
  Ok(Json(grade))
}

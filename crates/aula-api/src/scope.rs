//! Per-actor scoping: which profile an account owns and which subjects and
//! final exams a professor is assigned to.

use uuid::Uuid;

use aula_core::{
  people::{Professor, Student},
  store::AcademicStore,
};

use crate::{
  auth::CurrentUser,
  error::{ApiError, store_err},
};

/// The student profile of the current user. An account without one cannot
/// enroll, so this is a form error rather than a 404.
pub async fn student_profile<S: AcademicStore>(
  store: &S,
  user: &CurrentUser,
) -> Result<Student, ApiError> {
  store
    .student_for_user(user.0.user_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| {
      ApiError::Validation("this account has no student profile".into())
    })
}

pub async fn professor_profile<S: AcademicStore>(
  store: &S,
  user: &CurrentUser,
) -> Result<Professor, ApiError> {
  store
    .professor_for_user(user.0.user_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::Forbidden("this account has no professor profile".into()))
}

/// 404 for an unknown subject, 403 when the professor is not assigned to it.
pub async fn require_subject_assignment<S: AcademicStore>(
  store: &S,
  professor: &Professor,
  subject_code: &str,
) -> Result<(), ApiError> {
  if store
    .get_subject(subject_code)
    .await
    .map_err(store_err)?
    .is_none()
  {
    return Err(ApiError::NotFound(format!("subject {subject_code} not found")));
  }
  let assigned = store
    .is_assigned_to_subject(&professor.professor_id, subject_code)
    .await
    .map_err(store_err)?;
  if !assigned {
    tracing::warn!(
      professor_id = %professor.professor_id,
      subject = subject_code,
      "professor is not assigned to subject"
    );
    return Err(ApiError::Forbidden(format!(
      "you are not assigned to subject {subject_code}"
    )));
  }
  Ok(())
}

/// 404 for an unknown final exam, 403 when the professor is not assigned to
/// it.
pub async fn require_final_exam_assignment<S: AcademicStore>(
  store: &S,
  professor: &Professor,
  final_exam_id: Uuid,
) -> Result<(), ApiError> {
  if store
    .get_final_exam(final_exam_id)
    .await
    .map_err(store_err)?
    .is_none()
  {
    return Err(ApiError::NotFound(format!("final exam {final_exam_id} not found")));
  }
  let assigned = store
    .is_assigned_to_final_exam(&professor.professor_id, final_exam_id)
    .await
    .map_err(store_err)?;
  if !assigned {
    return Err(ApiError::Forbidden("you are not assigned to this final exam".into()));
  }
  Ok(())
}

//! Per-role dashboards.

use axum::extract::State;
use chrono::Local;
use serde::Serialize;

use aula_core::{
  access::Operation,
  catalog::{CatalogSummary, FinalExam, Subject},
  certificate::RegularCertificate,
  enrollment::Enrollment,
  grade::{Grade, GradeStatus},
  people::{Professor, Student},
  store::AcademicStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{ApiError, store_err},
  extract::Json,
  scope,
};

#[derive(Debug, Serialize)]
pub struct StudentDashboard {
  pub student:          Student,
  /// Subjects of the student's career.
  pub subjects:         Vec<Subject>,
  pub enrollments:      Vec<Enrollment>,
  pub grades:           Vec<Grade>,
  /// Final exams of subjects in which the student is regular.
  pub open_final_exams: Vec<FinalExam>,
}

/// `GET /dashboard/student`
pub async fn student<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<StudentDashboard>, ApiError> {
  user.authorize(Operation::ViewStudentDashboard)?;
  let store = state.store.as_ref();
  let student = scope::student_profile(store, &user).await?;

  let subjects = match &student.career_code {
    Some(career) => store
      .list_subjects(Some(career.clone()))
      .await
      .map_err(store_err)?,
    None => Vec::new(),
  };
  let enrollments = store
    .list_enrollments_for_student(&student.student_id)
    .await
    .map_err(store_err)?;
  let grades = store
    .list_grades_for_student(&student.student_id)
    .await
    .map_err(store_err)?;

  let mut open_final_exams = Vec::new();
  for grade in grades.iter().filter(|g| g.status() == GradeStatus::Regular) {
    let exams = store
      .list_final_exams(Some(grade.subject_code().to_owned()))
      .await
      .map_err(store_err)?;
    open_final_exams.extend(exams);
  }

  Ok(Json(StudentDashboard {
    student,
    subjects,
    enrollments,
    grades,
    open_final_exams,
  }))
}

#[derive(Debug, Serialize)]
pub struct ProfessorDashboard {
  pub professor:   Professor,
  pub subjects:    Vec<Subject>,
  pub final_exams: Vec<FinalExam>,
}

/// `GET /dashboard/professor`
pub async fn professor<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<ProfessorDashboard>, ApiError> {
  user.authorize(Operation::ViewProfessorDashboard)?;
  let store = state.store.as_ref();
  let professor = scope::professor_profile(store, &user).await?;
  let subjects = store
    .subjects_for_professor(&professor.professor_id)
    .await
    .map_err(store_err)?;
  let final_exams = store
    .final_exams_for_professor(&professor.professor_id)
    .await
    .map_err(store_err)?;
  Ok(Json(ProfessorDashboard { professor, subjects, final_exams }))
}

/// `GET /dashboard/admin`
pub async fn admin<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<CatalogSummary>, ApiError> {
  user.authorize(Operation::ViewAdminDashboard)?;
  let summary = state.store.catalog_summary().await.map_err(store_err)?;
  Ok(Json(summary))
}

/// `GET /dashboard/student/certificate` — the regular-student certificate
/// of the current user, dated today.
pub async fn certificate<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<RegularCertificate>, ApiError> {
  user.authorize(Operation::IssueCertificate)?;
  let today = Local::now().date_naive();
  let certificate = state
    .store
    .regular_certificate(user.0.user_id, today)
    .await
    .map_err(store_err)?;
  Ok(Json(certificate))
}

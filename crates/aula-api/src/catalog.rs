//! Handlers for the academic catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`/`POST` | `/faculties` | |
//! | `GET`/`PUT`/`DELETE` | `/faculties/{code}` | delete refused while careers exist |
//! | `GET`/`POST` | `/careers` | optional `?faculty=<code>` |
//! | `GET`/`PUT`/`DELETE` | `/careers/{code}` | delete refused while students or subjects exist |
//! | `GET`/`POST` | `/subjects` | optional `?career=<code>` |
//! | `GET`/`PUT`/`DELETE` | `/subjects/{code}` | delete refused while enrollments or finals exist |
//! | `GET`/`POST` | `/finals` | optional `?subject=<code>` |
//! | `GET`/`PUT`/`DELETE` | `/finals/{id}` | delete refused while enrollments exist |
//!
//! Reads need [`Operation::BrowseCatalog`], writes [`Operation::ManageCatalog`].

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use aula_core::{
  access::Operation,
  catalog::{Career, Faculty, FinalExam, NewFinalExam, Subject},
  store::AcademicStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{ApiError, store_err},
  extract::Json,
};

// ─── Faculties ───────────────────────────────────────────────────────────────

/// `GET /faculties`
pub async fn list_faculties<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<Faculty>>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let faculties = state.store.list_faculties().await.map_err(store_err)?;
  Ok(Json(faculties))
}

/// `POST /faculties`
pub async fn create_faculty<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<Faculty>,
) -> Result<impl IntoResponse, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  let faculty = state.store.create_faculty(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(faculty)))
}

/// `GET /faculties/{code}`
pub async fn get_faculty<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<Json<Faculty>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let faculty = state
    .store
    .get_faculty(&code)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("faculty {code} not found")))?;
  Ok(Json(faculty))
}

/// `PUT /faculties/{code}` — the path code wins over any code in the body.
pub async fn update_faculty<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
  Json(mut body): Json<Faculty>,
) -> Result<Json<Faculty>, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  body.code = code;
  let faculty = state.store.update_faculty(body).await.map_err(store_err)?;
  Ok(Json(faculty))
}

/// `DELETE /faculties/{code}`
pub async fn delete_faculty<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  state.store.delete_faculty(&code).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Careers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CareerParams {
  pub faculty: Option<String>,
}

/// `GET /careers[?faculty=<code>]`
pub async fn list_careers<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Query(params): Query<CareerParams>,
) -> Result<Json<Vec<Career>>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let careers = state
    .store
    .list_careers(params.faculty)
    .await
    .map_err(store_err)?;
  Ok(Json(careers))
}

/// `POST /careers`
pub async fn create_career<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<Career>,
) -> Result<impl IntoResponse, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  let career = state.store.create_career(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(career)))
}

/// `GET /careers/{code}`
pub async fn get_career<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<Json<Career>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let career = state
    .store
    .get_career(&code)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("career {code} not found")))?;
  Ok(Json(career))
}

/// `PUT /careers/{code}`
pub async fn update_career<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
  Json(mut body): Json<Career>,
) -> Result<Json<Career>, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  body.code = code;
  let career = state.store.update_career(body).await.map_err(store_err)?;
  Ok(Json(career))
}

/// `DELETE /careers/{code}`
pub async fn delete_career<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  state.store.delete_career(&code).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubjectParams {
  pub career: Option<String>,
}

/// `GET /subjects[?career=<code>]`
pub async fn list_subjects<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Query(params): Query<SubjectParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let subjects = state
    .store
    .list_subjects(params.career)
    .await
    .map_err(store_err)?;
  Ok(Json(subjects))
}

/// `POST /subjects`
pub async fn create_subject<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<Subject>,
) -> Result<impl IntoResponse, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  let subject = state.store.create_subject(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

/// `GET /subjects/{code}`
pub async fn get_subject<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<Json<Subject>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let subject = state
    .store
    .get_subject(&code)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {code} not found")))?;
  Ok(Json(subject))
}

/// `PUT /subjects/{code}`
pub async fn update_subject<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
  Json(mut body): Json<Subject>,
) -> Result<Json<Subject>, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  body.code = code;
  let subject = state.store.update_subject(body).await.map_err(store_err)?;
  Ok(Json(subject))
}

/// `DELETE /subjects/{code}`
pub async fn delete_subject<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  state.store.delete_subject(&code).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Final exams ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FinalExamParams {
  pub subject: Option<String>,
}

/// `GET /finals[?subject=<code>]`
pub async fn list_final_exams<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Query(params): Query<FinalExamParams>,
) -> Result<Json<Vec<FinalExam>>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let exams = state
    .store
    .list_final_exams(params.subject)
    .await
    .map_err(store_err)?;
  Ok(Json(exams))
}

/// `POST /finals` — the id is assigned by the server.
pub async fn create_final_exam<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<NewFinalExam>,
) -> Result<impl IntoResponse, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  let exam = state.store.create_final_exam(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(exam)))
}

/// `GET /finals/{id}`
pub async fn get_final_exam<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<FinalExam>, ApiError> {
  user.authorize(Operation::BrowseCatalog)?;
  let exam = state
    .store
    .get_final_exam(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("final exam {id} not found")))?;
  Ok(Json(exam))
}

/// `PUT /finals/{id}`
pub async fn update_final_exam<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<NewFinalExam>,
) -> Result<Json<FinalExam>, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  let exam = state
    .store
    .update_final_exam(body.with_id(id))
    .await
    .map_err(store_err)?;
  Ok(Json(exam))
}

/// `DELETE /finals/{id}`
pub async fn delete_final_exam<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  user.authorize(Operation::ManageCatalog)?;
  state.store.delete_final_exam(id).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

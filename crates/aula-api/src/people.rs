//! Handlers for users, profiles and professor assignments.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | the authenticated user |
//! | `GET`/`POST` | `/users` | optional `?role=<role>` |
//! | `GET`/`PUT` | `/users/{id}` | an empty or missing password keeps the old one |
//! | `PUT`  | `/users/{id}/active` | body: `{"active":false}` |
//! | `GET`/`POST` | `/students`, `/professors` | profiles |
//! | `GET`  | `/students/{id}`, `/professors/{id}` | |
//! | `PUT`  | `/subjects/{code}/professors` | body: `{"professor_ids":[…]}` |
//! | `PUT`  | `/finals/{id}/professors` | body: `{"professor_ids":[…]}` |

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use aula_core::{
  access::{Operation, Role},
  people::{AssignmentChange, NewUser, Professor, Student, User, UserUpdate},
  store::AcademicStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{ApiError, store_err},
  extract::Json,
  password::hash_password_with_params,
};

/// `GET /me`
pub async fn me(user: CurrentUser) -> Json<User> { Json(user.0) }

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserParams {
  pub role: Option<Role>,
}

/// `GET /users[?role=<role>]`
pub async fn list_users<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Query(params): Query<UserParams>,
) -> Result<Json<Vec<User>>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let users = state.store.list_users(params.role).await.map_err(store_err)?;
  Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  pub username:   String,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub dni:        Option<String>,
  pub role:       Role,
  pub password:   String,
}

/// `POST /users` — the password is hashed before it reaches the store.
pub async fn create_user<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  if body.password.is_empty() {
    return Err(ApiError::Validation("password is required".into()));
  }
  let password_hash = hash_password_with_params(&body.password, state.password_params)
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let created = state
    .store
    .create_user(NewUser {
      username: body.username,
      first_name: body.first_name,
      last_name: body.last_name,
      email: body.email,
      dni: body.dni,
      role: body.role,
      password_hash,
    })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /users/{id}`
pub async fn get_user<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let found = state
    .store
    .get_user(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(found))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub dni:        Option<String>,
  /// Omitted or empty keeps the current password.
  pub password:   Option<String>,
}

/// `PUT /users/{id}` — the username and role are fixed at creation.
pub async fn update_user<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateUserBody>,
) -> Result<Json<User>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let password_hash = match body.password.as_deref() {
    None | Some("") => None,
    Some(password) => Some(
      hash_password_with_params(password, state.password_params)
        .map_err(|e| ApiError::Store(Box::new(e)))?,
    ),
  };
  let updated = state
    .store
    .update_user(id, UserUpdate {
      first_name: body.first_name,
      last_name: body.last_name,
      email: body.email,
      dni: body.dni,
      password_hash,
    })
    .await
    .map_err(store_err)?;
  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub active: bool,
}

/// `PUT /users/{id}/active`
pub async fn set_active<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<Json<User>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  if id == user.0.user_id && !body.active {
    return Err(ApiError::Validation("you cannot deactivate your own account".into()));
  }
  let updated = state
    .store
    .set_user_active(id, body.active)
    .await
    .map_err(store_err)?;
  Ok(Json(updated))
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StudentParams {
  pub career: Option<String>,
}

/// `GET /students[?career=<code>]`
pub async fn list_students<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Query(params): Query<StudentParams>,
) -> Result<Json<Vec<Student>>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let students = state
    .store
    .list_students(params.career)
    .await
    .map_err(store_err)?;
  Ok(Json(students))
}

/// `POST /students`
pub async fn create_student<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<Student>,
) -> Result<impl IntoResponse, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let student = state.store.create_student(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(student)))
}

/// `GET /students/{id}`
pub async fn get_student<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Student>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let student = state
    .store
    .get_student(&id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(student))
}

/// `GET /professors`
pub async fn list_professors<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<Professor>>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let professors = state.store.list_professors().await.map_err(store_err)?;
  Ok(Json(professors))
}

/// `POST /professors`
pub async fn create_professor<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<Professor>,
) -> Result<impl IntoResponse, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let professor = state.store.create_professor(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(professor)))
}

/// `GET /professors/{id}`
pub async fn get_professor<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Professor>, ApiError> {
  user.authorize(Operation::ManageUsers)?;
  let professor = state
    .store
    .get_professor(&id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("professor {id} not found")))?;
  Ok(Json(professor))
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignmentBody {
  pub professor_ids: Vec<String>,
}

/// `PUT /subjects/{code}/professors`
pub async fn assign_subject<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
  Json(body): Json<AssignmentBody>,
) -> Result<Json<AssignmentChange>, ApiError> {
  user.authorize(Operation::AssignProfessors)?;
  let change = state
    .store
    .assign_subject_professors(code, body.professor_ids)
    .await
    .map_err(store_err)?;
  Ok(Json(change))
}

/// `PUT /finals/{id}/professors`
pub async fn assign_final_exam<S: AcademicStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignmentBody>,
) -> Result<Json<AssignmentChange>, ApiError> {
  user.authorize(Operation::AssignProfessors)?;
  let change = state
    .store
    .assign_final_exam_professors(id, body.professor_ids)
    .await
    .map_err(store_err)?;
  Ok(Json(change))
}

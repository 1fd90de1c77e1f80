//! User accounts and the student / professor profiles attached to them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  access::{Actor, Role},
  catalog::require,
};

// ─── Users ───────────────────────────────────────────────────────────────────

/// A login account. The password hash lives in [`Credentials`] and is never
/// part of this type, so serialising a user can't leak it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  /// National identity document number, unique when present.
  pub dni:        Option<String>,
  pub role:       Role,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn actor(&self) -> Actor { Actor::new(self.user_id, self.role) }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Input to [`crate::store::AcademicStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub dni:           Option<String>,
  pub role:          Role,
  /// Argon2 PHC string; hashing is the caller's concern.
  pub password_hash: String,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    require("username", &self.username)?;
    if self.username.contains([':', ' ']) {
      return Err(Error::validation(
        "username may not contain spaces or colons",
      ));
    }
    require("first name", &self.first_name)?;
    require("last name", &self.last_name)?;
    require("password", &self.password_hash)?;
    validate_dni(self.dni.as_deref())
  }
}

/// Input to [`crate::store::AcademicStore::update_user`]. The username and
/// role never change.
#[derive(Debug, Clone)]
pub struct UserUpdate {
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub dni:           Option<String>,
  /// New Argon2 PHC string; `None` keeps the stored one.
  pub password_hash: Option<String>,
}

impl UserUpdate {
  pub fn validate(&self) -> Result<()> {
    require("first name", &self.first_name)?;
    require("last name", &self.last_name)?;
    if let Some(hash) = &self.password_hash {
      require("password", hash)?;
    }
    validate_dni(self.dni.as_deref())
  }
}

fn validate_dni(dni: Option<&str>) -> Result<()> {
  match dni {
    Some(dni) if dni.trim().is_empty() => {
      Err(Error::validation("dni may not be blank"))
    }
    Some(dni) if dni.len() > 20 => {
      Err(Error::validation(format!("dni {dni:?} is longer than 20 characters")))
    }
    _ => Ok(()),
  }
}

/// A user together with the stored password hash, for authentication.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// The student profile of a user with [`Role::Student`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub student_id:      String,
  pub user_id:         Uuid,
  /// Students without a career can't enroll in subjects.
  pub career_code:     Option<String>,
  pub enrollment_date: NaiveDate,
}

impl Student {
  pub fn validate(&self) -> Result<()> { require("student id", &self.student_id) }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProfessorCategory {
  Titular,
  Adjunct,
  Auxiliar,
}

/// The professor profile of a user with [`Role::Professor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
  pub professor_id: String,
  pub user_id:      Uuid,
  pub degree:       String,
  pub category:     ProfessorCategory,
  pub hire_date:    NaiveDate,
}

impl Professor {
  pub fn validate(&self) -> Result<()> {
    require("professor id", &self.professor_id)?;
    require("degree", &self.degree)
  }
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// What an assignment replacement changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentChange {
  pub added:   Vec<String>,
  pub removed: Vec<String>,
}

impl AssignmentChange {
  pub fn changed(&self) -> bool {
    !self.added.is_empty() || !self.removed.is_empty()
  }
}

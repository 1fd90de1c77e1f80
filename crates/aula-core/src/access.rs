//! Role-based access control.
//!
//! Every actor carries exactly one [`Role`]. Roles are flat: there is no
//! hierarchy and no composition, so an administrator cannot grade and a
//! professor cannot enroll. Each [`Operation`] lists the roles allowed to
//! invoke it; handlers call [`Actor::authorize`] before doing anything else.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The role of a user account.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Administrator,
  Professor,
  Student,
}

/// Every operation the service exposes, grouped by the component that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
  // ── Catalog ─────────────────────────────────────────────────────────────
  BrowseCatalog,
  ManageCatalog,
  // ── People ──────────────────────────────────────────────────────────────
  ManageUsers,
  AssignProfessors,
  // ── Enrollment ──────────────────────────────────────────────────────────
  Enroll,
  // ── Grades ──────────────────────────────────────────────────────────────
  ViewGrades,
  EditGrades,
  ViewFinalExamRoster,
  // ── Dashboards ──────────────────────────────────────────────────────────
  ViewAdminDashboard,
  ViewProfessorDashboard,
  ViewStudentDashboard,
  IssueCertificate,
}

impl Operation {
  /// The roles permitted to invoke this operation.
  pub fn allowed_roles(self) -> &'static [Role] {
    use Role::*;
    match self {
      Self::BrowseCatalog => &[Administrator, Professor, Student],
      Self::ManageCatalog
      | Self::ManageUsers
      | Self::AssignProfessors
      | Self::ViewAdminDashboard => &[Administrator],
      Self::ViewGrades
      | Self::EditGrades
      | Self::ViewFinalExamRoster
      | Self::ViewProfessorDashboard => &[Professor],
      Self::Enroll | Self::ViewStudentDashboard | Self::IssueCertificate => {
        &[Student]
      }
    }
  }
}

/// Whether `actor_role` satisfies `required_role`. Roles only match
/// themselves.
pub fn has_role(actor_role: Role, required_role: Role) -> bool {
  actor_role == required_role
}

/// Whether a user with `role` may invoke `operation`.
pub fn permits(role: Role, operation: Operation) -> bool {
  operation
    .allowed_roles()
    .iter()
    .any(|&required| has_role(role, required))
}

/// The authenticated user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

  /// Fail with [`Error::Forbidden`] unless this actor may invoke `operation`.
  pub fn authorize(&self, operation: Operation) -> Result<()> {
    if permits(self.role, operation) {
      Ok(())
    } else {
      Err(Error::forbidden(format!(
        "role {} may not {operation}",
        self.role
      )))
    }
  }
}

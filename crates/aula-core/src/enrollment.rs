//! Enrollments: a student's intent to take a subject or sit a final exam.
//!
//! Enrollments are immutable. There is at most one per (student, offering).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a student enrolls in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Offering {
  Subject { subject_code: String },
  FinalExam { final_exam_id: Uuid },
}

impl Offering {
  pub fn subject(code: impl Into<String>) -> Self {
    Self::Subject { subject_code: code.into() }
  }

  pub fn final_exam(id: Uuid) -> Self { Self::FinalExam { final_exam_id: id } }

  pub fn kind(&self) -> OfferingKind {
    match self {
      Self::Subject { .. } => OfferingKind::Subject,
      Self::FinalExam { .. } => OfferingKind::FinalExam,
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OfferingKind {
  Subject,
  FinalExam,
}

/// A persisted enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id: Uuid,
  pub student_id:    String,
  pub offering:      Offering,
  /// Server-assigned; never changes.
  pub enrolled_at:   DateTime<Utc>,
}

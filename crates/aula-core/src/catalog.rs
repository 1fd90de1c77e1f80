//! The academic catalog: faculties, careers, subjects and final exams.
//!
//! Catalog entries are reference data keyed by short institutional codes
//! (final exams use a UUID). They are validated here, before any backend
//! sees them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Longest accepted institutional code.
pub const MAX_CODE_LEN: usize = 10;

// ─── Faculty ─────────────────────────────────────────────────────────────────

/// A faculty or school within the institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
  pub code:        String,
  pub name:        String,
  pub address:     String,
  pub phone:       String,
  pub email:       String,
  pub website:     String,
  pub dean:        String,
  pub established: NaiveDate,
  pub description: Option<String>,
}

impl Faculty {
  pub fn validate(&self) -> Result<()> {
    validate_code("faculty", &self.code)?;
    require("faculty name", &self.name)?;
    require("dean", &self.dean)?;
    if !self.email.contains('@') {
      return Err(Error::validation(format!(
        "invalid faculty email: {:?}",
        self.email
      )));
    }
    Ok(())
  }
}

// ─── Career ──────────────────────────────────────────────────────────────────

/// A degree programme offered by a faculty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Career {
  pub code:           String,
  pub name:           String,
  pub faculty_code:   String,
  pub director:       String,
  pub duration_years: u8,
  pub description:    Option<String>,
}

impl Career {
  pub fn validate(&self) -> Result<()> {
    validate_code("career", &self.code)?;
    require("career name", &self.name)?;
    require("faculty code", &self.faculty_code)?;
    if self.duration_years == 0 {
      return Err(Error::validation("career duration must be at least one year"));
    }
    Ok(())
  }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

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
pub enum SubjectCategory {
  Obligatory,
  Elective,
}

/// When in the academic year a subject is taught.
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
pub enum Period {
  First,
  Second,
  Annual,
}

/// A course within a career's curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub code:         String,
  pub name:         String,
  pub career_code:  String,
  /// Recommended year in the plan, starting at 1.
  pub year:         u8,
  pub category:     SubjectCategory,
  pub period:       Period,
  pub weekly_hours: u8,
  pub description:  Option<String>,
}

impl Subject {
  pub fn validate(&self) -> Result<()> {
    validate_code("subject", &self.code)?;
    require("subject name", &self.name)?;
    require("career code", &self.career_code)?;
    if self.year == 0 {
      return Err(Error::validation("subject year must be at least 1"));
    }
    if self.weekly_hours == 0 {
      return Err(Error::validation("weekly hours must be positive"));
    }
    Ok(())
  }
}

// ─── Final exam ──────────────────────────────────────────────────────────────

/// A final-exam call for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalExam {
  pub final_exam_id:    Uuid,
  pub subject_code:     String,
  pub date:             NaiveDate,
  pub location:         String,
  pub duration_minutes: u32,
  /// Ordinal of the call within the exam period.
  pub call_number:      u8,
  pub notes:            Option<String>,
}

/// Input to [`crate::store::AcademicStore::create_final_exam`]. The id is
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewFinalExam {
  pub subject_code:     String,
  pub date:             NaiveDate,
  pub location:         String,
  pub duration_minutes: u32,
  pub call_number:      u8,
  pub notes:            Option<String>,
}

impl NewFinalExam {
  pub fn validate(&self) -> Result<()> {
    require("subject code", &self.subject_code)?;
    require("location", &self.location)?;
    if self.duration_minutes == 0 {
      return Err(Error::validation("exam duration must be positive"));
    }
    if self.call_number == 0 {
      return Err(Error::validation("call number must be at least 1"));
    }
    Ok(())
  }

  pub fn with_id(self, final_exam_id: Uuid) -> FinalExam {
    FinalExam {
      final_exam_id,
      subject_code: self.subject_code,
      date: self.date,
      location: self.location,
      duration_minutes: self.duration_minutes,
      call_number: self.call_number,
      notes: self.notes,
    }
  }
}

impl FinalExam {
  pub fn validate(&self) -> Result<()> {
    NewFinalExam {
      subject_code:     self.subject_code.clone(),
      date:             self.date,
      location:         self.location.clone(),
      duration_minutes: self.duration_minutes,
      call_number:      self.call_number,
      notes:            None,
    }
    .validate()
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Entity counts shown on the administrator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
  pub faculties:   u64,
  pub careers:     u64,
  pub subjects:    u64,
  pub final_exams: u64,
  pub students:    u64,
  pub professors:  u64,
}

// ─── Field checks ────────────────────────────────────────────────────────────

/// Codes are used in URL paths, so they must be short and slash-free.
pub fn validate_code(kind: &str, code: &str) -> Result<()> {
  if code.trim().is_empty() {
    return Err(Error::validation(format!("{kind} code is required")));
  }
  if code.len() > MAX_CODE_LEN {
    return Err(Error::validation(format!(
      "{kind} code {code:?} is longer than {MAX_CODE_LEN} characters"
    )));
  }
  if code.contains(['/', ' ']) {
    return Err(Error::validation(format!(
      "{kind} code {code:?} may not contain spaces or slashes"
    )));
  }
  Ok(())
}

pub(crate) fn require(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    Err(Error::validation(format!("{field} is required")))
  } else {
    Ok(())
  }
}

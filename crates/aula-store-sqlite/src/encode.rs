//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings in UTC, calendar dates as `YYYY-MM-DD`.
//! Enums are stored as their lowercase names. UUIDs are stored as hyphenated
//! lowercase strings. Scores are `REAL`.

use std::str::FromStr;

use aula_core::{
  access::Role,
  catalog::{Career, Faculty, FinalExam, Subject},
  enrollment::{Enrollment, Offering},
  grade::{Grade, Score},
  people::{Professor, Student, User},
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Fixed-width microsecond timestamps so that text order is time order.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Parse a lowercase enum name written by `AsRef<str>`.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {column}: {s:?}")))
}

/// Scores were range-checked on the way in; a stored value outside the range
/// means the file was edited out of band.
pub fn decode_score(value: Option<f64>) -> Result<Option<Score>> {
  Score::new_optional(value).map_err(|e| Error::Decode(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const FACULTY_COLUMNS: &str = "code, name, address, phone, email, website, \
                                   dean, established, description";

pub const CAREER_COLUMNS: &str =
  "code, name, faculty_code, director, duration_years, description";

pub const SUBJECT_COLUMNS: &str = "code, name, career_code, year, category, \
                                   period, weekly_hours, description";

pub const FINAL_EXAM_COLUMNS: &str = "final_exam_id, subject_code, date, \
                                      location, duration_minutes, \
                                      call_number, notes";

pub const USER_COLUMNS: &str = "user_id, username, first_name, last_name, \
                                email, role, is_active, created_at, dni";

pub const STUDENT_COLUMNS: &str =
  "student_id, user_id, career_code, enrollment_date";

pub const PROFESSOR_COLUMNS: &str =
  "professor_id, user_id, degree, category, hire_date";

pub const GRADE_COLUMNS: &str = "student_id, subject_code, promotion_score, \
                                 final_score, notes, last_updated";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `faculties` row, in [`FACULTY_COLUMNS`] order.
pub struct RawFaculty {
  pub code:        String,
  pub name:        String,
  pub address:     String,
  pub phone:       String,
  pub email:       String,
  pub website:     String,
  pub dean:        String,
  pub established: String,
  pub description: Option<String>,
}

impl RawFaculty {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      code:        row.get(0)?,
      name:        row.get(1)?,
      address:     row.get(2)?,
      phone:       row.get(3)?,
      email:       row.get(4)?,
      website:     row.get(5)?,
      dean:        row.get(6)?,
      established: row.get(7)?,
      description: row.get(8)?,
    })
  }

  pub fn into_faculty(self) -> Result<Faculty> {
    Ok(Faculty {
      code:        self.code,
      name:        self.name,
      address:     self.address,
      phone:       self.phone,
      email:       self.email,
      website:     self.website,
      dean:        self.dean,
      established: decode_date(&self.established)?,
      description: self.description,
    })
  }
}

/// Careers have no encoded columns; rows map directly.
pub fn career_from_row(row: &Row<'_>) -> rusqlite::Result<Career> {
  Ok(Career {
    code:           row.get(0)?,
    name:           row.get(1)?,
    faculty_code:   row.get(2)?,
    director:       row.get(3)?,
    duration_years: row.get(4)?,
    description:    row.get(5)?,
  })
}

pub struct RawSubject {
  pub code:         String,
  pub name:         String,
  pub career_code:  String,
  pub year:         u8,
  pub category:     String,
  pub period:       String,
  pub weekly_hours: u8,
  pub description:  Option<String>,
}

impl RawSubject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      code:         row.get(0)?,
      name:         row.get(1)?,
      career_code:  row.get(2)?,
      year:         row.get(3)?,
      category:     row.get(4)?,
      period:       row.get(5)?,
      weekly_hours: row.get(6)?,
      description:  row.get(7)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      code:         self.code,
      name:         self.name,
      career_code:  self.career_code,
      year:         self.year,
      category:     decode_enum("subject category", &self.category)?,
      period:       decode_enum("period", &self.period)?,
      weekly_hours: self.weekly_hours,
      description:  self.description,
    })
  }
}

pub struct RawFinalExam {
  pub final_exam_id:    String,
  pub subject_code:     String,
  pub date:             String,
  pub location:         String,
  pub duration_minutes: u32,
  pub call_number:      u8,
  pub notes:            Option<String>,
}

impl RawFinalExam {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      final_exam_id:    row.get(0)?,
      subject_code:     row.get(1)?,
      date:             row.get(2)?,
      location:         row.get(3)?,
      duration_minutes: row.get(4)?,
      call_number:      row.get(5)?,
      notes:            row.get(6)?,
    })
  }

  pub fn into_final_exam(self) -> Result<FinalExam> {
    Ok(FinalExam {
      final_exam_id:    decode_uuid(&self.final_exam_id)?,
      subject_code:     self.subject_code,
      date:             decode_date(&self.date)?,
      location:         self.location,
      duration_minutes: self.duration_minutes,
      call_number:      self.call_number,
      notes:            self.notes,
    })
  }
}

pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub role:       String,
  pub is_active:  bool,
  pub created_at: String,
  pub dni:        Option<String>,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      first_name: row.get(2)?,
      last_name:  row.get(3)?,
      email:      row.get(4)?,
      role:       row.get(5)?,
      is_active:  row.get(6)?,
      created_at: row.get(7)?,
      dni:        row.get(8)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      first_name: self.first_name,
      last_name:  self.last_name,
      email:      self.email,
      dni:        self.dni,
      role:       decode_enum::<Role>("role", &self.role)?,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawStudent {
  pub student_id:      String,
  pub user_id:         String,
  pub career_code:     Option<String>,
  pub enrollment_date: String,
}

impl RawStudent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:      row.get(0)?,
      user_id:         row.get(1)?,
      career_code:     row.get(2)?,
      enrollment_date: row.get(3)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id:      self.student_id,
      user_id:         decode_uuid(&self.user_id)?,
      career_code:     self.career_code,
      enrollment_date: decode_date(&self.enrollment_date)?,
    })
  }
}

pub struct RawProfessor {
  pub professor_id: String,
  pub user_id:      String,
  pub degree:       String,
  pub category:     String,
  pub hire_date:    String,
}

impl RawProfessor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      professor_id: row.get(0)?,
      user_id:      row.get(1)?,
      degree:       row.get(2)?,
      category:     row.get(3)?,
      hire_date:    row.get(4)?,
    })
  }

  pub fn into_professor(self) -> Result<Professor> {
    Ok(Professor {
      professor_id: self.professor_id,
      user_id:      decode_uuid(&self.user_id)?,
      degree:       self.degree,
      category:     decode_enum("professor category", &self.category)?,
      hire_date:    decode_date(&self.hire_date)?,
    })
  }
}

/// An enrollment row from either enrollment table. `target` holds the
/// subject code or the final-exam UUID depending on `kind`.
pub struct RawEnrollment {
  pub enrollment_id: String,
  pub student_id:    String,
  pub kind:          String,
  pub target:        String,
  pub enrolled_at:   String,
}

impl RawEnrollment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      enrollment_id: row.get(0)?,
      student_id:    row.get(1)?,
      kind:          row.get(2)?,
      target:        row.get(3)?,
      enrolled_at:   row.get(4)?,
    })
  }

  pub fn into_enrollment(self) -> Result<Enrollment> {
    let offering = match self.kind.as_str() {
      "subject" => Offering::subject(self.target),
      "final_exam" => Offering::final_exam(decode_uuid(&self.target)?),
      other => {
        return Err(Error::Decode(format!("unknown offering kind: {other:?}")));
      }
    };
    Ok(Enrollment {
      enrollment_id: decode_uuid(&self.enrollment_id)?,
      student_id: self.student_id,
      offering,
      enrolled_at: decode_dt(&self.enrolled_at)?,
    })
  }
}

/// A `grades` row in [`GRADE_COLUMNS`] order. The stored `status` column is
/// not read back: [`Grade::from_parts`] derives it.
pub struct RawGrade {
  pub student_id:      String,
  pub subject_code:    String,
  pub promotion_score: Option<f64>,
  pub final_score:     Option<f64>,
  pub notes:           Option<String>,
  pub last_updated:    String,
}

impl RawGrade {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:      row.get(0)?,
      subject_code:    row.get(1)?,
      promotion_score: row.get(2)?,
      final_score:     row.get(3)?,
      notes:           row.get(4)?,
      last_updated:    row.get(5)?,
    })
  }

  pub fn into_grade(self) -> Result<Grade> {
    Ok(Grade::from_parts(
      self.student_id,
      self.subject_code,
      decode_score(self.promotion_score)?,
      decode_score(self.final_score)?,
      self.notes,
      decode_dt(&self.last_updated)?,
    ))
  }
}

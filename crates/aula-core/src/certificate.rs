//! The regular-student certificate: proof that a student is enrolled in a
//! career, issued on demand to the student.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  catalog::{Career, Faculty},
  people::{Student, User},
};

/// Everything printed on a regular-student certificate.
///
/// Career and faculty fields are empty for a student without a career.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegularCertificate {
  pub full_name:       String,
  pub first_name:      String,
  pub last_name:       String,
  pub dni:             String,
  pub student_id:      String,
  pub career_code:     String,
  pub career_name:     String,
  pub faculty_name:    String,
  pub enrollment_date: NaiveDate,
  pub issued_on:       NaiveDate,
  /// Base name for the rendered document.
  pub filename:        String,
}

impl RegularCertificate {
  pub fn new(
    user: &User,
    student: &Student,
    career: Option<&Career>,
    faculty: Option<&Faculty>,
    issued_on: NaiveDate,
  ) -> Self {
    let full_name = format!("{} {}", user.first_name, user.last_name);
    let full_name = match full_name.trim() {
      "" => user.username.clone(),
      name => name.to_owned(),
    };
    Self {
      full_name,
      first_name: user.first_name.clone(),
      last_name: user.last_name.clone(),
      dni: user.dni.clone().unwrap_or_default(),
      student_id: student.student_id.clone(),
      career_code: career.map(|c| c.code.clone()).unwrap_or_default(),
      career_name: career.map(|c| c.name.clone()).unwrap_or_default(),
      faculty_name: faculty.map(|f| f.name.clone()).unwrap_or_default(),
      enrollment_date: student.enrollment_date,
      issued_on,
      filename: certificate_filename(user, issued_on),
    }
  }
}

/// `certificado-regular-<last name>-<YYYYMMDD>`, falling back to the
/// username when the last name is blank.
pub fn certificate_filename(user: &User, issued_on: NaiveDate) -> String {
  let name = match user.last_name.trim() {
    "" => user.username.as_str(),
    last => last,
  };
  format!("certificado-regular-{name}-{}", issued_on.format("%Y%m%d"))
}

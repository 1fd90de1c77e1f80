//! Enrollments and grades.
//!
//! A subject enrollment and its grade placeholder are written together, and
//! grade reads backfill missing placeholders inside the same transaction as
//! the read. Grade status is always derived by [`Grade`]; the value stored in
//! the `status` column is only ever the one `Grade` computed.

use aula_core::{
  Error as CoreError,
  enrollment::{Enrollment, Offering},
  grade::{Grade, GradeStatus, GradeUpdate, Score},
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, Transaction, params};

use crate::{
  catalog::exists,
  encode::{GRADE_COLUMNS, RawEnrollment, RawGrade, encode_dt, encode_uuid},
  error::{lift, reject},
};

type DbResult<T> = tokio_rusqlite::Result<T>;

// ─── Enrollments ─────────────────────────────────────────────────────────────

/// Insert an enrollment after checking the offering, the student's career,
/// and duplicates. A subject enrollment also creates the `free` grade
/// placeholder.
pub fn enroll(
  conn: &mut Connection,
  enrollment: &Enrollment,
) -> DbResult<()> {
  let student_id = enrollment.student_id.as_str();
  let enrollment_id = encode_uuid(enrollment.enrollment_id);
  let enrolled_at = encode_dt(enrollment.enrolled_at);

  let tx = conn.transaction()?;
  let career: Option<Option<String>> = tx
    .query_row(
      "SELECT career_code FROM students WHERE student_id = ?1",
      [student_id],
      |r| r.get(0),
    )
    .optional()?;
  let Some(student_career) = career else {
    return Err(reject(CoreError::not_found("student", student_id)));
  };

  match &enrollment.offering {
    Offering::Subject { subject_code } => {
      let subject_career: Option<String> = tx
        .query_row(
          "SELECT career_code FROM subjects WHERE code = ?1",
          [subject_code],
          |r| r.get(0),
        )
        .optional()?;
      let Some(subject_career) = subject_career else {
        return Err(reject(CoreError::not_found("subject", subject_code)));
      };
      if student_career.as_deref() != Some(subject_career.as_str()) {
        return Err(reject(CoreError::validation(format!(
          "subject {subject_code} does not belong to the student's career"
        ))));
      }
      if exists(
        &tx,
        "SELECT 1 FROM subject_enrollments
          WHERE student_id = ?1 AND subject_code = ?2",
        [student_id, subject_code],
      )? {
        return Err(reject(CoreError::validation(format!(
          "student {student_id} is already enrolled in subject {subject_code}"
        ))));
      }
      tx.execute(
        "INSERT INTO subject_enrollments
           (enrollment_id, student_id, subject_code, enrolled_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![enrollment_id, student_id, subject_code, enrolled_at],
      )?;
      insert_placeholders(&tx, subject_code, Some(student_id), enrollment.enrolled_at)?;
    }
    Offering::FinalExam { final_exam_id } => {
      let exam_id = encode_uuid(*final_exam_id);
      if !exists(
        &tx,
        "SELECT 1 FROM final_exams WHERE final_exam_id = ?1",
        [&exam_id],
      )? {
        return Err(reject(CoreError::not_found("final exam", final_exam_id)));
      }
      if exists(
        &tx,
        "SELECT 1 FROM final_exam_enrollments
          WHERE student_id = ?1 AND final_exam_id = ?2",
        [student_id, exam_id.as_str()],
      )? {
        return Err(reject(CoreError::validation(format!(
          "student {student_id} is already enrolled in this final exam"
        ))));
      }
      tx.execute(
        "INSERT INTO final_exam_enrollments
           (enrollment_id, student_id, final_exam_id, enrolled_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![enrollment_id, student_id, exam_id, enrolled_at],
      )?;
    }
  }
  tx.commit()?;
  Ok(())
}

pub fn enrollments_for_student(
  conn: &Connection,
  student_id: &str,
) -> DbResult<Vec<RawEnrollment>> {
  let mut stmt = conn.prepare(
    "SELECT enrollment_id, student_id, 'subject', subject_code, enrolled_at
       FROM subject_enrollments WHERE student_id = ?1
     UNION ALL
     SELECT enrollment_id, student_id, 'final_exam', final_exam_id, enrolled_at
       FROM final_exam_enrollments WHERE student_id = ?1
     ORDER BY enrolled_at",
  )?;
  let rows = stmt
    .query_map([student_id], RawEnrollment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// The roster of an offering, ordered by student name. Fails with not-found
/// when the offering does not exist.
pub fn enrollments_for_offering(
  conn: &Connection,
  offering: &Offering,
) -> DbResult<Vec<RawEnrollment>> {
  let (kind, exists_sql, sql, key) = match offering {
    Offering::Subject { subject_code } => (
      "subject",
      "SELECT 1 FROM subjects WHERE code = ?1",
      "SELECT e.enrollment_id, e.student_id, 'subject', e.subject_code, e.enrolled_at
         FROM subject_enrollments e
         JOIN students s ON s.student_id = e.student_id
         JOIN users u    ON u.user_id = s.user_id
        WHERE e.subject_code = ?1
        ORDER BY u.last_name, u.first_name, e.student_id",
      subject_code.clone(),
    ),
    Offering::FinalExam { final_exam_id } => (
      "final exam",
      "SELECT 1 FROM final_exams WHERE final_exam_id = ?1",
      "SELECT e.enrollment_id, e.student_id, 'final_exam', e.final_exam_id,
              e.enrolled_at
         FROM final_exam_enrollments e
         JOIN students s ON s.student_id = e.student_id
         JOIN users u    ON u.user_id = s.user_id
        WHERE e.final_exam_id = ?1
        ORDER BY u.last_name, u.first_name, e.student_id",
      encode_uuid(*final_exam_id),
    ),
  };
  if !exists(conn, exists_sql, [&key])? {
    return Err(reject(CoreError::not_found(kind, &key)));
  }
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map([&key], RawEnrollment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Grades ──────────────────────────────────────────────────────────────────

/// Create a `free` grade row for every enrollment in `subject_code` that has
/// none (optionally only for one student). Existing rows are left untouched.
/// Returns the number of rows created.
fn insert_placeholders(
  tx: &Transaction<'_>,
  subject_code: &str,
  student_id: Option<&str>,
  now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
  tx.execute(
    "INSERT OR IGNORE INTO grades
       (student_id, subject_code, promotion_score, final_score, status,
        last_updated, notes)
     SELECT e.student_id, e.subject_code, NULL, NULL, ?3, ?4, NULL
       FROM subject_enrollments e
      WHERE e.subject_code = ?1
        AND (?2 IS NULL OR e.student_id = ?2)",
    params![
      subject_code,
      student_id,
      GradeStatus::Free.as_ref(),
      encode_dt(now),
    ],
  )
}

/// Backfill then read the grades of a subject, ordered by student name.
/// Returns the rows and how many placeholders were created.
pub fn grades_for_subject(
  conn: &mut Connection,
  subject_code: &str,
  now: DateTime<Utc>,
) -> DbResult<(Vec<RawGrade>, usize)> {
  let columns = GRADE_COLUMNS
    .split(", ")
    .map(|c| format!("g.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ");

  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM subjects WHERE code = ?1", [subject_code])? {
    return Err(reject(CoreError::not_found("subject", subject_code)));
  }
  let created = insert_placeholders(&tx, subject_code, None, now)?;
  let rows = {
    let mut stmt = tx.prepare(&format!(
      "SELECT {columns} FROM grades g
         JOIN students s ON s.student_id = g.student_id
         JOIN users u    ON u.user_id = s.user_id
        WHERE g.subject_code = ?1
        ORDER BY u.last_name, u.first_name, g.student_id"
    ))?;
    stmt
      .query_map([subject_code], RawGrade::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  tx.commit()?;
  Ok((rows, created))
}

pub fn grades_for_student(
  conn: &Connection,
  student_id: &str,
) -> DbResult<Vec<RawGrade>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {GRADE_COLUMNS} FROM grades WHERE student_id = ?1 ORDER BY subject_code"
  ))?;
  let rows = stmt
    .query_map([student_id], RawGrade::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// A change to one grade row.
pub enum GradeEdit {
  FinalScore(Option<Score>),
  Form(GradeUpdate),
}

/// Load (or start) the grade of an enrolled student, apply `edit`, and upsert
/// the result. Without an enrollment nothing is written.
pub fn write_grade(
  conn: &mut Connection,
  student_id: &str,
  subject_code: &str,
  edit: GradeEdit,
  now: DateTime<Utc>,
) -> DbResult<Grade> {
  let tx = conn.transaction()?;
  if !exists(
    &tx,
    "SELECT 1 FROM subject_enrollments WHERE student_id = ?1 AND subject_code = ?2",
    [student_id, subject_code],
  )? {
    return Err(reject(CoreError::validation(format!(
      "student {student_id} is not enrolled in subject {subject_code}"
    ))));
  }

  let existing = tx
    .query_row(
      &format!(
        "SELECT {GRADE_COLUMNS} FROM grades
          WHERE student_id = ?1 AND subject_code = ?2"
      ),
      [student_id, subject_code],
      RawGrade::from_row,
    )
    .optional()?;
  let mut grade = match existing {
    Some(raw) => lift(raw.into_grade())?,
    None => Grade::placeholder(student_id, subject_code, now),
  };

  match edit {
    GradeEdit::FinalScore(score) => grade.set_final_score(score, now),
    GradeEdit::Form(update) => grade.apply(update, now),
  }

  tx.execute(
    "INSERT INTO grades
       (student_id, subject_code, promotion_score, final_score, status,
        last_updated, notes)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT (student_id, subject_code) DO UPDATE SET
       promotion_score = excluded.promotion_score,
       final_score     = excluded.final_score,
       status          = excluded.status,
       last_updated    = excluded.last_updated,
       notes           = excluded.notes",
    params![
      grade.student_id(),
      grade.subject_code(),
      grade.promotion_score().map(Score::value),
      grade.final_score().map(Score::value),
      grade.status().as_ref(),
      encode_dt(grade.last_updated()),
      grade.notes(),
    ],
  )?;
  tx.commit()?;
  Ok(grade)
}

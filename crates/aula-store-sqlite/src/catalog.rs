//! Catalog queries: faculties, careers, subjects, final exams.
//!
//! Every function runs on the connection thread inside
//! `tokio_rusqlite::Connection::call`. Guarded deletes and inserts that check
//! a parent row run in a transaction.

use aula_core::{
  Error as CoreError,
  catalog::{CatalogSummary, Career, Faculty, FinalExam, Subject},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  encode::{
    CAREER_COLUMNS, FACULTY_COLUMNS, FINAL_EXAM_COLUMNS, RawFaculty, RawFinalExam,
    RawSubject, SUBJECT_COLUMNS, career_from_row, encode_date, encode_uuid,
  },
  error::reject,
};

type DbResult<T> = tokio_rusqlite::Result<T>;

/// Whether `sql` (a `SELECT 1 …`) matches at least one row.
pub(crate) fn exists(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params, |_| Ok(())).optional()?.is_some())
}

// ─── Faculties ───────────────────────────────────────────────────────────────

pub fn insert_faculty(conn: &Connection, f: &Faculty) -> DbResult<()> {
  if exists(conn, "SELECT 1 FROM faculties WHERE code = ?1", [&f.code])? {
    return Err(reject(CoreError::validation(format!(
      "faculty {} already exists",
      f.code
    ))));
  }
  conn.execute(
    "INSERT INTO faculties (
       code, name, address, phone, email, website, dean, established, description
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      f.code,
      f.name,
      f.address,
      f.phone,
      f.email,
      f.website,
      f.dean,
      encode_date(f.established),
      f.description,
    ],
  )?;
  Ok(())
}

pub fn get_faculty(conn: &Connection, code: &str) -> DbResult<Option<RawFaculty>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {FACULTY_COLUMNS} FROM faculties WHERE code = ?1"),
        [code],
        RawFaculty::from_row,
      )
      .optional()?,
  )
}

pub fn list_faculties(conn: &Connection) -> DbResult<Vec<RawFaculty>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {FACULTY_COLUMNS} FROM faculties ORDER BY name"))?;
  let rows = stmt
    .query_map([], RawFaculty::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn update_faculty(conn: &Connection, f: &Faculty) -> DbResult<()> {
  let changed = conn.execute(
    "UPDATE faculties
        SET name = ?2, address = ?3, phone = ?4, email = ?5, website = ?6,
            dean = ?7, established = ?8, description = ?9
      WHERE code = ?1",
    params![
      f.code,
      f.name,
      f.address,
      f.phone,
      f.email,
      f.website,
      f.dean,
      encode_date(f.established),
      f.description,
    ],
  )?;
  if changed == 0 {
    return Err(reject(CoreError::not_found("faculty", &f.code)));
  }
  Ok(())
}

pub fn delete_faculty(conn: &mut Connection, code: &str) -> DbResult<()> {
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM faculties WHERE code = ?1", [code])? {
    return Err(reject(CoreError::not_found("faculty", code)));
  }
  if exists(&tx, "SELECT 1 FROM careers WHERE faculty_code = ?1", [code])? {
    return Err(reject(CoreError::validation(format!(
      "faculty {code} still has careers; delete or reassign them first"
    ))));
  }
  tx.execute("DELETE FROM faculties WHERE code = ?1", [code])?;
  tx.commit()?;
  Ok(())
}

// ─── Careers ─────────────────────────────────────────────────────────────────

fn require_faculty(conn: &Connection, code: &str) -> DbResult<()> {
  if exists(conn, "SELECT 1 FROM faculties WHERE code = ?1", [code])? {
    Ok(())
  } else {
    Err(reject(CoreError::validation(format!("unknown faculty {code}"))))
  }
}

pub fn insert_career(conn: &mut Connection, c: &Career) -> DbResult<()> {
  let tx = conn.transaction()?;
  if exists(&tx, "SELECT 1 FROM careers WHERE code = ?1", [&c.code])? {
    return Err(reject(CoreError::validation(format!(
      "career {} already exists",
      c.code
    ))));
  }
  require_faculty(&tx, &c.faculty_code)?;
  tx.execute(
    "INSERT INTO careers (code, name, faculty_code, director, duration_years, description)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      c.code,
      c.name,
      c.faculty_code,
      c.director,
      c.duration_years,
      c.description,
    ],
  )?;
  tx.commit()?;
  Ok(())
}

pub fn get_career(conn: &Connection, code: &str) -> DbResult<Option<Career>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {CAREER_COLUMNS} FROM careers WHERE code = ?1"),
        [code],
        career_from_row,
      )
      .optional()?,
  )
}

pub fn list_careers(
  conn: &Connection,
  faculty_code: Option<&str>,
) -> DbResult<Vec<Career>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CAREER_COLUMNS} FROM careers
      WHERE (?1 IS NULL OR faculty_code = ?1)
      ORDER BY name"
  ))?;
  let rows = stmt
    .query_map([faculty_code], career_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn update_career(conn: &mut Connection, c: &Career) -> DbResult<()> {
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM careers WHERE code = ?1", [&c.code])? {
    return Err(reject(CoreError::not_found("career", &c.code)));
  }
  require_faculty(&tx, &c.faculty_code)?;
  tx.execute(
    "UPDATE careers
        SET name = ?2, faculty_code = ?3, director = ?4, duration_years = ?5,
            description = ?6
      WHERE code = ?1",
    params![
      c.code,
      c.name,
      c.faculty_code,
      c.director,
      c.duration_years,
      c.description,
    ],
  )?;
  tx.commit()?;
  Ok(())
}

pub fn delete_career(conn: &mut Connection, code: &str) -> DbResult<()> {
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM careers WHERE code = ?1", [code])? {
    return Err(reject(CoreError::not_found("career", code)));
  }
  if exists(&tx, "SELECT 1 FROM students WHERE career_code = ?1", [code])? {
    return Err(reject(CoreError::validation(format!(
      "career {code} still has students; delete or reassign them first"
    ))));
  }
  if exists(&tx, "SELECT 1 FROM subjects WHERE career_code = ?1", [code])? {
    return Err(reject(CoreError::validation(format!(
      "career {code} still has subjects; delete them first"
    ))));
  }
  tx.execute("DELETE FROM careers WHERE code = ?1", [code])?;
  tx.commit()?;
  Ok(())
}

// ─── Subjects ────────────────────────────────────────────────────────────────

fn require_career(conn: &Connection, code: &str) -> DbResult<()> {
  if exists(conn, "SELECT 1 FROM careers WHERE code = ?1", [code])? {
    Ok(())
  } else {
    Err(reject(CoreError::validation(format!("unknown career {code}"))))
  }
}

pub fn insert_subject(conn: &mut Connection, s: &Subject) -> DbResult<()> {
  let tx = conn.transaction()?;
  if exists(&tx, "SELECT 1 FROM subjects WHERE code = ?1", [&s.code])? {
    return Err(reject(CoreError::validation(format!(
      "subject {} already exists",
      s.code
    ))));
  }
  require_career(&tx, &s.career_code)?;
  tx.execute(
    "INSERT INTO subjects (
       code, name, career_code, year, category, period, weekly_hours, description
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      s.code,
      s.name,
      s.career_code,
      s.year,
      s.category.as_ref(),
      s.period.as_ref(),
      s.weekly_hours,
      s.description,
    ],
  )?;
  tx.commit()?;
  Ok(())
}

pub fn get_subject(conn: &Connection, code: &str) -> DbResult<Option<RawSubject>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE code = ?1"),
        [code],
        RawSubject::from_row,
      )
      .optional()?,
  )
}

pub fn list_subjects(
  conn: &Connection,
  career_code: Option<&str>,
) -> DbResult<Vec<RawSubject>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {SUBJECT_COLUMNS} FROM subjects
      WHERE (?1 IS NULL OR career_code = ?1)
      ORDER BY year, name"
  ))?;
  let rows = stmt
    .query_map([career_code], RawSubject::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn update_subject(conn: &mut Connection, s: &Subject) -> DbResult<()> {
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM subjects WHERE code = ?1", [&s.code])? {
    return Err(reject(CoreError::not_found("subject", &s.code)));
  }
  require_career(&tx, &s.career_code)?;
  tx.execute(
    "UPDATE subjects
        SET name = ?2, career_code = ?3, year = ?4, category = ?5, period = ?6,
            weekly_hours = ?7, description = ?8
      WHERE code = ?1",
    params![
      s.code,
      s.name,
      s.career_code,
      s.year,
      s.category.as_ref(),
      s.period.as_ref(),
      s.weekly_hours,
      s.description,
    ],
  )?;
  tx.commit()?;
  Ok(())
}

/// Professor assignments go with the subject (`ON DELETE CASCADE`).
pub fn delete_subject(conn: &mut Connection, code: &str) -> DbResult<()> {
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM subjects WHERE code = ?1", [code])? {
    return Err(reject(CoreError::not_found("subject", code)));
  }
  if exists(
    &tx,
    "SELECT 1 FROM subject_enrollments WHERE subject_code = ?1",
    [code],
  )? {
    return Err(reject(CoreError::validation(format!(
      "subject {code} has enrollments and cannot be deleted"
    ))));
  }
  if exists(&tx, "SELECT 1 FROM final_exams WHERE subject_code = ?1", [code])? {
    return Err(reject(CoreError::validation(format!(
      "subject {code} still has final exams; delete them first"
    ))));
  }
  tx.execute("DELETE FROM subjects WHERE code = ?1", [code])?;
  tx.commit()?;
  Ok(())
}

// ─── Final exams ─────────────────────────────────────────────────────────────

fn require_subject(conn: &Connection, code: &str) -> DbResult<()> {
  if exists(conn, "SELECT 1 FROM subjects WHERE code = ?1", [code])? {
    Ok(())
  } else {
    Err(reject(CoreError::validation(format!("unknown subject {code}"))))
  }
}

pub fn insert_final_exam(conn: &mut Connection, e: &FinalExam) -> DbResult<()> {
  let tx = conn.transaction()?;
  require_subject(&tx, &e.subject_code)?;
  tx.execute(
    "INSERT INTO final_exams (
       final_exam_id, subject_code, date, location, duration_minutes,
       call_number, notes
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(e.final_exam_id),
      e.subject_code,
      encode_date(e.date),
      e.location,
      e.duration_minutes,
      e.call_number,
      e.notes,
    ],
  )?;
  tx.commit()?;
  Ok(())
}

pub fn get_final_exam(conn: &Connection, id: &str) -> DbResult<Option<RawFinalExam>> {
  Ok(
    conn
      .query_row(
        &format!(
          "SELECT {FINAL_EXAM_COLUMNS} FROM final_exams WHERE final_exam_id = ?1"
        ),
        [id],
        RawFinalExam::from_row,
      )
      .optional()?,
  )
}

pub fn list_final_exams(
  conn: &Connection,
  subject_code: Option<&str>,
) -> DbResult<Vec<RawFinalExam>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {FINAL_EXAM_COLUMNS} FROM final_exams
      WHERE (?1 IS NULL OR subject_code = ?1)
      ORDER BY date, call_number"
  ))?;
  let rows = stmt
    .query_map([subject_code], RawFinalExam::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn update_final_exam(conn: &mut Connection, e: &FinalExam) -> DbResult<()> {
  let id = encode_uuid(e.final_exam_id);
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM final_exams WHERE final_exam_id = ?1", [&id])? {
    return Err(reject(CoreError::not_found("final exam", e.final_exam_id)));
  }
  require_subject(&tx, &e.subject_code)?;
  tx.execute(
    "UPDATE final_exams
        SET subject_code = ?2, date = ?3, location = ?4, duration_minutes = ?5,
            call_number = ?6, notes = ?7
      WHERE final_exam_id = ?1",
    params![
      id,
      e.subject_code,
      encode_date(e.date),
      e.location,
      e.duration_minutes,
      e.call_number,
      e.notes,
    ],
  )?;
  tx.commit()?;
  Ok(())
}

pub fn delete_final_exam(conn: &mut Connection, id: &str) -> DbResult<()> {
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM final_exams WHERE final_exam_id = ?1", [id])? {
    return Err(reject(CoreError::not_found("final exam", id)));
  }
  if exists(
    &tx,
    "SELECT 1 FROM final_exam_enrollments WHERE final_exam_id = ?1",
    [id],
  )? {
    return Err(reject(CoreError::validation(
      "final exam has enrollments and cannot be deleted",
    )));
  }
  tx.execute("DELETE FROM final_exams WHERE final_exam_id = ?1", [id])?;
  tx.commit()?;
  Ok(())
}

// ─── Summary ─────────────────────────────────────────────────────────────────

pub fn summary(conn: &Connection) -> DbResult<CatalogSummary> {
  let count = |table: &str| -> rusqlite::Result<u64> {
    let n: i64 =
      conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(n.max(0) as u64)
  };
  Ok(CatalogSummary {
    faculties:   count("faculties")?,
    careers:     count("careers")?,
    subjects:    count("subjects")?,
    final_exams: count("final_exams")?,
    students:    count("students")?,
    professors:  count("professors")?,
  })
}

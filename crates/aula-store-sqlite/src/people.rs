//! Users, student and professor profiles, and professor assignments.

use std::collections::BTreeSet;

use aula_core::{
  Error as CoreError,
  access::Role,
  catalog::Career,
  people::{AssignmentChange, Professor, Student, User, UserUpdate},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  catalog::{self, exists},
  encode::{
    FINAL_EXAM_COLUMNS, PROFESSOR_COLUMNS, RawFaculty, RawFinalExam, RawProfessor, RawStudent,
    RawSubject, RawUser, STUDENT_COLUMNS, SUBJECT_COLUMNS, USER_COLUMNS, encode_date,
    encode_dt, encode_uuid,
  },
  error::reject,
};

type DbResult<T> = tokio_rusqlite::Result<T>;

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn insert_user(conn: &Connection, user: &User, password_hash: &str) -> DbResult<()> {
  if exists(conn, "SELECT 1 FROM users WHERE username = ?1", [&user.username])? {
    return Err(reject(CoreError::validation(format!(
      "username {} is already taken",
      user.username
    ))));
  }
  require_free_dni(conn, user.dni.as_deref(), None)?;
  conn.execute(
    "INSERT INTO users (
       user_id, username, first_name, last_name, email, dni, role,
       password_hash, is_active, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    params![
      encode_uuid(user.user_id),
      user.username,
      user.first_name,
      user.last_name,
      user.email,
      user.dni,
      user.role.as_ref(),
      password_hash,
      user.is_active,
      encode_dt(user.created_at),
    ],
  )?;
  Ok(())
}

/// A dni may belong to one user only; `owner` is exempt from the check.
fn require_free_dni(conn: &Connection, dni: Option<&str>, owner: Option<&str>) -> DbResult<()> {
  let Some(dni) = dni else { return Ok(()) };
  if exists(
    conn,
    "SELECT 1 FROM users WHERE dni = ?1 AND (?2 IS NULL OR user_id <> ?2)",
    params![dni, owner],
  )? {
    return Err(reject(CoreError::validation(format!(
      "dni {dni} is already registered"
    ))));
  }
  Ok(())
}

pub fn get_user(conn: &Connection, user_id: &str) -> DbResult<Option<RawUser>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
        [user_id],
        RawUser::from_row,
      )
      .optional()?,
  )
}

/// The user row plus the stored password hash.
pub fn find_credentials(
  conn: &Connection,
  username: &str,
) -> DbResult<Option<(RawUser, String)>> {
  Ok(
    conn
      .query_row(
        &format!(
          "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"
        ),
        [username],
        |row| Ok((RawUser::from_row(row)?, row.get(9)?)),
      )
      .optional()?,
  )
}

pub fn list_users(conn: &Connection, role: Option<&str>) -> DbResult<Vec<RawUser>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {USER_COLUMNS} FROM users
      WHERE (?1 IS NULL OR role = ?1)
      ORDER BY last_name, first_name, username"
  ))?;
  let rows = stmt
    .query_map([role], RawUser::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn set_user_active(
  conn: &Connection,
  user_id: &str,
  active: bool,
) -> DbResult<RawUser> {
  let changed = conn.execute(
    "UPDATE users SET is_active = ?2 WHERE user_id = ?1",
    params![user_id, active],
  )?;
  if changed == 0 {
    return Err(reject(CoreError::not_found("user", user_id)));
  }
  get_user(conn, user_id)?
    .ok_or_else(|| reject(CoreError::not_found("user", user_id)))
}

/// Overwrite the editable fields of a user. A `None` password hash keeps the
/// stored one.
pub fn update_user(
  conn: &mut Connection,
  user_id: &str,
  update: &UserUpdate,
) -> DbResult<RawUser> {
  let tx = conn.transaction()?;
  if !exists(&tx, "SELECT 1 FROM users WHERE user_id = ?1", [user_id])? {
    return Err(reject(CoreError::not_found("user", user_id)));
  }
  require_free_dni(&tx, update.dni.as_deref(), Some(user_id))?;
  tx.execute(
    "UPDATE users
        SET first_name = ?2, last_name = ?3, email = ?4, dni = ?5,
            password_hash = COALESCE(?6, password_hash)
      WHERE user_id = ?1",
    params![
      user_id,
      update.first_name,
      update.last_name,
      update.email,
      update.dni,
      update.password_hash,
    ],
  )?;
  let raw = get_user(&tx, user_id)?
    .ok_or_else(|| reject(CoreError::not_found("user", user_id)))?;
  tx.commit()?;
  Ok(raw)
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// The user must exist, hold `role`, and not have a profile of that kind yet.
fn require_profile_owner(
  conn: &Connection,
  user_id: &str,
  role: Role,
  profile_table: &str,
) -> DbResult<()> {
  let stored: Option<String> = conn
    .query_row("SELECT role FROM users WHERE user_id = ?1", [user_id], |r| {
      r.get(0)
    })
    .optional()?;
  match stored {
    None => {
      return Err(reject(CoreError::validation(format!("unknown user {user_id}"))));
    }
    Some(stored) if stored != role.as_ref() => {
      return Err(reject(CoreError::validation(format!(
        "user {user_id} does not have the {role} role"
      ))));
    }
    Some(_) => {}
  }
  if exists(
    conn,
    &format!("SELECT 1 FROM {profile_table} WHERE user_id = ?1"),
    [user_id],
  )? {
    return Err(reject(CoreError::validation(format!(
      "user {user_id} already has a {role} profile"
    ))));
  }
  Ok(())
}

pub fn insert_student(conn: &mut Connection, s: &Student) -> DbResult<()> {
  let user_id = encode_uuid(s.user_id);
  let tx = conn.transaction()?;
  if exists(&tx, "SELECT 1 FROM students WHERE student_id = ?1", [&s.student_id])? {
    return Err(reject(CoreError::validation(format!(
      "student {} already exists",
      s.student_id
    ))));
  }
  require_profile_owner(&tx, &user_id, Role::Student, "students")?;
  if let Some(career) = &s.career_code {
    if !exists(&tx, "SELECT 1 FROM careers WHERE code = ?1", [career])? {
      return Err(reject(CoreError::validation(format!("unknown career {career}"))));
    }
  }
  tx.execute(
    "INSERT INTO students (student_id, user_id, career_code, enrollment_date)
     VALUES (?1, ?2, ?3, ?4)",
    params![s.student_id, user_id, s.career_code, encode_date(s.enrollment_date)],
  )?;
  tx.commit()?;
  Ok(())
}

pub fn get_student(conn: &Connection, student_id: &str) -> DbResult<Option<RawStudent>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"),
        [student_id],
        RawStudent::from_row,
      )
      .optional()?,
  )
}

pub fn student_for_user(conn: &Connection, user_id: &str) -> DbResult<Option<RawStudent>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE user_id = ?1"),
        [user_id],
        RawStudent::from_row,
      )
      .optional()?,
  )
}

pub fn list_students(
  conn: &Connection,
  career_code: Option<&str>,
) -> DbResult<Vec<RawStudent>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {STUDENT_COLUMNS} FROM students
      WHERE (?1 IS NULL OR career_code = ?1)
      ORDER BY student_id"
  ))?;
  let rows = stmt
    .query_map([career_code], RawStudent::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn insert_professor(conn: &mut Connection, p: &Professor) -> DbResult<()> {
  let user_id = encode_uuid(p.user_id);
  let tx = conn.transaction()?;
  if exists(
    &tx,
    "SELECT 1 FROM professors WHERE professor_id = ?1",
    [&p.professor_id],
  )? {
    return Err(reject(CoreError::validation(format!(
      "professor {} already exists",
      p.professor_id
    ))));
  }
  require_profile_owner(&tx, &user_id, Role::Professor, "professors")?;
  tx.execute(
    "INSERT INTO professors (professor_id, user_id, degree, category, hire_date)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      p.professor_id,
      user_id,
      p.degree,
      p.category.as_ref(),
      encode_date(p.hire_date),
    ],
  )?;
  tx.commit()?;
  Ok(())
}

pub fn get_professor(
  conn: &Connection,
  professor_id: &str,
) -> DbResult<Option<RawProfessor>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {PROFESSOR_COLUMNS} FROM professors WHERE professor_id = ?1"),
        [professor_id],
        RawProfessor::from_row,
      )
      .optional()?,
  )
}

pub fn professor_for_user(
  conn: &Connection,
  user_id: &str,
) -> DbResult<Option<RawProfessor>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {PROFESSOR_COLUMNS} FROM professors WHERE user_id = ?1"),
        [user_id],
        RawProfessor::from_row,
      )
      .optional()?,
  )
}

pub fn list_professors(conn: &Connection) -> DbResult<Vec<RawProfessor>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PROFESSOR_COLUMNS} FROM professors ORDER BY professor_id"
  ))?;
  let rows = stmt
    .query_map([], RawProfessor::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Certificates ────────────────────────────────────────────────────────────

/// Rows behind a regular-student certificate.
pub struct CertificateRows {
  pub user:    RawUser,
  pub student: RawStudent,
  pub career:  Option<Career>,
  pub faculty: Option<RawFaculty>,
}

/// Read the user, student profile, career and faculty in one transaction.
pub fn certificate_rows(conn: &mut Connection, user_id: &str) -> DbResult<CertificateRows> {
  let tx = conn.transaction()?;
  let user = get_user(&tx, user_id)?
    .ok_or_else(|| reject(CoreError::not_found("user", user_id)))?;
  let student = student_for_user(&tx, user_id)?.ok_or_else(|| {
    reject(CoreError::validation(
      "this account has no student profile; ask an administrator to set it up",
    ))
  })?;
  let career = match &student.career_code {
    Some(code) => catalog::get_career(&tx, code)?,
    None => None,
  };
  let faculty = match &career {
    Some(c) => catalog::get_faculty(&tx, &c.faculty_code)?,
    None => None,
  };
  tx.commit()?;
  Ok(CertificateRows { user, student, career, faculty })
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// Which assignment table a replacement targets.
#[derive(Clone, Copy)]
pub enum AssignmentTarget {
  Subject,
  FinalExam,
}

impl AssignmentTarget {
  fn table(self) -> &'static str {
    match self {
      Self::Subject => "subject_professors",
      Self::FinalExam => "final_exam_professors",
    }
  }

  fn key_column(self) -> &'static str {
    match self {
      Self::Subject => "subject_code",
      Self::FinalExam => "final_exam_id",
    }
  }

  fn parent_exists_sql(self) -> &'static str {
    match self {
      Self::Subject => "SELECT 1 FROM subjects WHERE code = ?1",
      Self::FinalExam => "SELECT 1 FROM final_exams WHERE final_exam_id = ?1",
    }
  }

  fn kind(self) -> &'static str {
    match self {
      Self::Subject => "subject",
      Self::FinalExam => "final exam",
    }
  }
}

/// Replace the professors assigned to `key` with exactly `professor_ids`, in
/// one transaction. Returns the sorted difference.
pub fn replace_assignments(
  conn: &mut Connection,
  target: AssignmentTarget,
  key: &str,
  professor_ids: &[String],
) -> DbResult<AssignmentChange> {
  let (table, column) = (target.table(), target.key_column());
  let tx = conn.transaction()?;
  if !exists(&tx, target.parent_exists_sql(), [key])? {
    return Err(reject(CoreError::not_found(target.kind(), key)));
  }

  let wanted: BTreeSet<&str> = professor_ids.iter().map(String::as_str).collect();
  for id in &wanted {
    if !exists(&tx, "SELECT 1 FROM professors WHERE professor_id = ?1", [id])? {
      return Err(reject(CoreError::validation(format!("unknown professor {id}"))));
    }
  }

  let current: BTreeSet<String> = {
    let mut stmt = tx.prepare(&format!(
      "SELECT professor_id FROM {table} WHERE {column} = ?1"
    ))?;
    stmt
      .query_map([key], |r| r.get(0))?
      .collect::<rusqlite::Result<_>>()?
  };

  let removed: Vec<String> = current
    .iter()
    .filter(|id| !wanted.contains(id.as_str()))
    .cloned()
    .collect();
  let added: Vec<String> = wanted
    .iter()
    .filter(|id| !current.contains(**id))
    .map(|id| id.to_string())
    .collect();

  for id in &removed {
    tx.execute(
      &format!("DELETE FROM {table} WHERE {column} = ?1 AND professor_id = ?2"),
      params![key, id],
    )?;
  }
  for id in &added {
    tx.execute(
      &format!("INSERT INTO {table} ({column}, professor_id) VALUES (?1, ?2)"),
      params![key, id],
    )?;
  }
  tx.commit()?;
  Ok(AssignmentChange { added, removed })
}

pub fn subjects_for_professor(
  conn: &Connection,
  professor_id: &str,
) -> DbResult<Vec<RawSubject>> {
  let columns = SUBJECT_COLUMNS
    .split(", ")
    .map(|c| format!("s.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ");
  let mut stmt = conn.prepare(&format!(
    "SELECT {columns} FROM subjects s
       JOIN subject_professors sp ON sp.subject_code = s.code
      WHERE sp.professor_id = ?1
      ORDER BY s.year, s.name"
  ))?;
  let rows = stmt
    .query_map([professor_id], RawSubject::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn final_exams_for_professor(
  conn: &Connection,
  professor_id: &str,
) -> DbResult<Vec<RawFinalExam>> {
  let columns = FINAL_EXAM_COLUMNS
    .split(", ")
    .map(|c| format!("f.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ");
  let mut stmt = conn.prepare(&format!(
    "SELECT {columns} FROM final_exams f
       JOIN final_exam_professors fp ON fp.final_exam_id = f.final_exam_id
      WHERE fp.professor_id = ?1
      ORDER BY f.date, f.call_number"
  ))?;
  let rows = stmt
    .query_map([professor_id], RawFinalExam::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn is_assigned(
  conn: &Connection,
  target: AssignmentTarget,
  professor_id: &str,
  key: &str,
) -> DbResult<bool> {
  Ok(exists(
    conn,
    &format!(
      "SELECT 1 FROM {} WHERE professor_id = ?1 AND {} = ?2",
      target.table(),
      target.key_column()
    ),
    [professor_id, key],
  )?)
}

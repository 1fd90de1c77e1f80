//! [`SqliteStore`] — the SQLite implementation of [`AcademicStore`].
//!
//! Query code lives in the [`catalog`](crate::catalog),
//! [`people`](crate::people) and [`ledger`](crate::ledger) modules and runs on
//! the connection thread; this module moves values in and out of
//! `Connection::call` and decodes rows into domain types.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SubsecRound as _, Utc};
use uuid::Uuid;

use aula_core::{
  access::Role,
  catalog::{CatalogSummary, Career, Faculty, FinalExam, NewFinalExam, Subject},
  certificate::RegularCertificate,
  enrollment::{Enrollment, Offering},
  grade::{Grade, GradeUpdate, Score},
  people::{
    AssignmentChange, Credentials, NewUser, Professor, Student, User, UserUpdate,
  },
  store::AcademicStore,
};

use crate::{
  Error, Result, catalog,
  encode::{
    RawFaculty, RawFinalExam, RawGrade, RawProfessor, RawStudent, RawSubject,
    encode_uuid,
  },
  ledger::{self, GradeEdit},
  people::{self, AssignmentTarget},
  schema::SCHEMA,
};

/// Stored timestamps carry microseconds; trim the clock to match so a value
/// handed back to the caller equals the one read later.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// An academic records store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL, bypassing every domain check. Tests use it to fabricate
  /// legacy rows.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn decode_all<R, T>(raws: Vec<R>, f: impl Fn(R) -> Result<T>) -> Result<Vec<T>> {
  raws.into_iter().map(f).collect()
}

// ─── AcademicStore impl ──────────────────────────────────────────────────────

impl AcademicStore for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Faculties ─────────────────────────────────────────────────────────────

  async fn create_faculty(&self, faculty: Faculty) -> Result<Faculty> {
    faculty.validate()?;
    let row = faculty.clone();
    self
      .conn
      .call(move |conn| catalog::insert_faculty(conn, &row))
      .await?;
    tracing::info!(code = %faculty.code, "created faculty");
    Ok(faculty)
  }

  async fn get_faculty(&self, code: &str) -> Result<Option<Faculty>> {
    let code = code.to_owned();
    let raw = self
      .conn
      .call(move |conn| catalog::get_faculty(conn, &code))
      .await?;
    raw.map(RawFaculty::into_faculty).transpose()
  }

  async fn list_faculties(&self) -> Result<Vec<Faculty>> {
    let raws = self.conn.call(|conn| catalog::list_faculties(conn)).await?;
    decode_all(raws, RawFaculty::into_faculty)
  }

  async fn update_faculty(&self, faculty: Faculty) -> Result<Faculty> {
    faculty.validate()?;
    let row = faculty.clone();
    self
      .conn
      .call(move |conn| catalog::update_faculty(conn, &row))
      .await?;
    tracing::info!(code = %faculty.code, "updated faculty");
    Ok(faculty)
  }

  async fn delete_faculty(&self, code: &str) -> Result<()> {
    let owned = code.to_owned();
    self
      .conn
      .call(move |conn| catalog::delete_faculty(conn, &owned))
      .await?;
    tracing::info!(code, "deleted faculty");
    Ok(())
  }

  // ── Careers ───────────────────────────────────────────────────────────────

  async fn create_career(&self, career: Career) -> Result<Career> {
    career.validate()?;
    let row = career.clone();
    self
      .conn
      .call(move |conn| catalog::insert_career(conn, &row))
      .await?;
    tracing::info!(code = %career.code, faculty = %career.faculty_code, "created career");
    Ok(career)
  }

  async fn get_career(&self, code: &str) -> Result<Option<Career>> {
    let code = code.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| catalog::get_career(conn, &code))
        .await?,
    )
  }

  async fn list_careers(&self, faculty_code: Option<String>) -> Result<Vec<Career>> {
    Ok(
      self
        .conn
        .call(move |conn| catalog::list_careers(conn, faculty_code.as_deref()))
        .await?,
    )
  }

  async fn update_career(&self, career: Career) -> Result<Career> {
    career.validate()?;
    let row = career.clone();
    self
      .conn
      .call(move |conn| catalog::update_career(conn, &row))
      .await?;
    tracing::info!(code = %career.code, "updated career");
    Ok(career)
  }

  async fn delete_career(&self, code: &str) -> Result<()> {
    let owned = code.to_owned();
    self
      .conn
      .call(move |conn| catalog::delete_career(conn, &owned))
      .await?;
    tracing::info!(code, "deleted career");
    Ok(())
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn create_subject(&self, subject: Subject) -> Result<Subject> {
    subject.validate()?;
    let row = subject.clone();
    self
      .conn
      .call(move |conn| catalog::insert_subject(conn, &row))
      .await?;
    tracing::info!(code = %subject.code, career = %subject.career_code, "created subject");
    Ok(subject)
  }

  async fn get_subject(&self, code: &str) -> Result<Option<Subject>> {
    let code = code.to_owned();
    let raw = self
      .conn
      .call(move |conn| catalog::get_subject(conn, &code))
      .await?;
    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self, career_code: Option<String>) -> Result<Vec<Subject>> {
    let raws = self
      .conn
      .call(move |conn| catalog::list_subjects(conn, career_code.as_deref()))
      .await?;
    decode_all(raws, RawSubject::into_subject)
  }

  async fn update_subject(&self, subject: Subject) -> Result<Subject> {
    subject.validate()?;
    let row = subject.clone();
    self
      .conn
      .call(move |conn| catalog::update_subject(conn, &row))
      .await?;
    tracing::info!(code = %subject.code, "updated subject");
    Ok(subject)
  }

  async fn delete_subject(&self, code: &str) -> Result<()> {
    let owned = code.to_owned();
    self
      .conn
      .call(move |conn| catalog::delete_subject(conn, &owned))
      .await?;
    tracing::info!(code, "deleted subject");
    Ok(())
  }

  // ── Final exams ───────────────────────────────────────────────────────────

  async fn create_final_exam(&self, exam: NewFinalExam) -> Result<FinalExam> {
    exam.validate()?;
    let exam = exam.with_id(Uuid::new_v4());
    let row = exam.clone();
    self
      .conn
      .call(move |conn| catalog::insert_final_exam(conn, &row))
      .await?;
    tracing::info!(
      final_exam_id = %exam.final_exam_id,
      subject = %exam.subject_code,
      "created final exam"
    );
    Ok(exam)
  }

  async fn get_final_exam(&self, id: Uuid) -> Result<Option<FinalExam>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| catalog::get_final_exam(conn, &id_str))
      .await?;
    raw.map(RawFinalExam::into_final_exam).transpose()
  }

  async fn list_final_exams(
    &self,
    subject_code: Option<String>,
  ) -> Result<Vec<FinalExam>> {
    let raws = self
      .conn
      .call(move |conn| catalog::list_final_exams(conn, subject_code.as_deref()))
      .await?;
    decode_all(raws, RawFinalExam::into_final_exam)
  }

  async fn update_final_exam(&self, exam: FinalExam) -> Result<FinalExam> {
    exam.validate()?;
    let row = exam.clone();
    self
      .conn
      .call(move |conn| catalog::update_final_exam(conn, &row))
      .await?;
    tracing::info!(final_exam_id = %exam.final_exam_id, "updated final exam");
    Ok(exam)
  }

  async fn delete_final_exam(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| catalog::delete_final_exam(conn, &id_str))
      .await?;
    tracing::info!(final_exam_id = %id, "deleted final exam");
    Ok(())
  }

  async fn catalog_summary(&self) -> Result<CatalogSummary> {
    Ok(self.conn.call(|conn| catalog::summary(conn)).await?)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, new: NewUser) -> Result<User> {
    new.validate()?;
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   new.username,
      first_name: new.first_name,
      last_name:  new.last_name,
      email:      new.email,
      dni:        new.dni,
      role:       new.role,
      is_active:  true,
      created_at: now(),
    };
    let row = user.clone();
    let hash = new.password_hash;
    self
      .conn
      .call(move |conn| people::insert_user(conn, &row, &hash))
      .await?;
    tracing::info!(
      user_id = %user.user_id,
      username = %user.username,
      role = %user.role,
      "created user"
    );
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| people::get_user(conn, &id_str))
      .await?;
    raw.map(|r| r.into_user()).transpose()
  }

  async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>> {
    let username = username.to_owned();
    let found = self
      .conn
      .call(move |conn| people::find_credentials(conn, &username))
      .await?;
    found
      .map(|(raw, password_hash)| {
        Ok(Credentials { user: raw.into_user()?, password_hash })
      })
      .transpose()
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
    let role = role.map(|r| r.as_ref().to_owned());
    let raws = self
      .conn
      .call(move |conn| people::list_users(conn, role.as_deref()))
      .await?;
    decode_all(raws, |r| r.into_user())
  }

  async fn set_user_active(&self, id: Uuid, active: bool) -> Result<User> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| people::set_user_active(conn, &id_str, active))
      .await?;
    tracing::info!(user_id = %id, active, "changed user activation");
    raw.into_user()
  }

  async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User> {
    update.validate()?;
    let id_str = encode_uuid(id);
    let password_changed = update.password_hash.is_some();
    let raw = self
      .conn
      .call(move |conn| people::update_user(conn, &id_str, &update))
      .await?;
    tracing::info!(user_id = %id, password_changed, "updated user");
    raw.into_user()
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn create_student(&self, student: Student) -> Result<Student> {
    student.validate()?;
    let row = student.clone();
    self
      .conn
      .call(move |conn| people::insert_student(conn, &row))
      .await?;
    tracing::info!(student_id = %student.student_id, "created student profile");
    Ok(student)
  }

  async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
    let student_id = student_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| people::get_student(conn, &student_id))
      .await?;
    raw.map(RawStudent::into_student).transpose()
  }

  async fn student_for_user(&self, user_id: Uuid) -> Result<Option<Student>> {
    let id_str = encode_uuid(user_id);
    let raw = self
      .conn
      .call(move |conn| people::student_for_user(conn, &id_str))
      .await?;
    raw.map(RawStudent::into_student).transpose()
  }

  async fn list_students(&self, career_code: Option<String>) -> Result<Vec<Student>> {
    let raws = self
      .conn
      .call(move |conn| people::list_students(conn, career_code.as_deref()))
      .await?;
    decode_all(raws, RawStudent::into_student)
  }

  async fn create_professor(&self, professor: Professor) -> Result<Professor> {
    professor.validate()?;
    let row = professor.clone();
    self
      .conn
      .call(move |conn| people::insert_professor(conn, &row))
      .await?;
    tracing::info!(professor_id = %professor.professor_id, "created professor profile");
    Ok(professor)
  }

  async fn get_professor(&self, professor_id: &str) -> Result<Option<Professor>> {
    let professor_id = professor_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| people::get_professor(conn, &professor_id))
      .await?;
    raw.map(RawProfessor::into_professor).transpose()
  }

  async fn professor_for_user(&self, user_id: Uuid) -> Result<Option<Professor>> {
    let id_str = encode_uuid(user_id);
    let raw = self
      .conn
      .call(move |conn| people::professor_for_user(conn, &id_str))
      .await?;
    raw.map(RawProfessor::into_professor).transpose()
  }

  async fn list_professors(&self) -> Result<Vec<Professor>> {
    let raws = self.conn.call(|conn| people::list_professors(conn)).await?;
    decode_all(raws, RawProfessor::into_professor)
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn assign_subject_professors(
    &self,
    subject_code: String,
    professor_ids: Vec<String>,
  ) -> Result<AssignmentChange> {
    let key = subject_code.clone();
    let change = self
      .conn
      .call(move |conn| {
        people::replace_assignments(
          conn,
          AssignmentTarget::Subject,
          &key,
          &professor_ids,
        )
      })
      .await?;
    tracing::info!(
      subject = %subject_code,
      added = ?change.added,
      removed = ?change.removed,
      "replaced subject professors"
    );
    Ok(change)
  }

  async fn assign_final_exam_professors(
    &self,
    final_exam_id: Uuid,
    professor_ids: Vec<String>,
  ) -> Result<AssignmentChange> {
    let key = encode_uuid(final_exam_id);
    let change = self
      .conn
      .call(move |conn| {
        people::replace_assignments(
          conn,
          AssignmentTarget::FinalExam,
          &key,
          &professor_ids,
        )
      })
      .await?;
    tracing::info!(
      final_exam_id = %final_exam_id,
      added = ?change.added,
      removed = ?change.removed,
      "replaced final exam professors"
    );
    Ok(change)
  }

  async fn subjects_for_professor(&self, professor_id: &str) -> Result<Vec<Subject>> {
    let professor_id = professor_id.to_owned();
    let raws = self
      .conn
      .call(move |conn| people::subjects_for_professor(conn, &professor_id))
      .await?;
    decode_all(raws, RawSubject::into_subject)
  }

  async fn final_exams_for_professor(
    &self,
    professor_id: &str,
  ) -> Result<Vec<FinalExam>> {
    let professor_id = professor_id.to_owned();
    let raws = self
      .conn
      .call(move |conn| people::final_exams_for_professor(conn, &professor_id))
      .await?;
    decode_all(raws, RawFinalExam::into_final_exam)
  }

  async fn is_assigned_to_subject(
    &self,
    professor_id: &str,
    subject_code: &str,
  ) -> Result<bool> {
    let (professor_id, subject_code) =
      (professor_id.to_owned(), subject_code.to_owned());
    Ok(
      self
        .conn
        .call(move |conn| {
          people::is_assigned(
            conn,
            AssignmentTarget::Subject,
            &professor_id,
            &subject_code,
          )
        })
        .await?,
    )
  }

  async fn is_assigned_to_final_exam(
    &self,
    professor_id: &str,
    final_exam_id: Uuid,
  ) -> Result<bool> {
    let professor_id = professor_id.to_owned();
    let key = encode_uuid(final_exam_id);
    Ok(
      self
        .conn
        .call(move |conn| {
          people::is_assigned(conn, AssignmentTarget::FinalExam, &professor_id, &key)
        })
        .await?,
    )
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  async fn enroll(&self, student_id: String, offering: Offering) -> Result<Enrollment> {
    let enrollment = Enrollment {
      enrollment_id: Uuid::new_v4(),
      student_id,
      offering,
      enrolled_at: now(),
    };
    let row = enrollment.clone();
    self
      .conn
      .call(move |conn| ledger::enroll(conn, &row))
      .await?;
    tracing::info!(
      student_id = %enrollment.student_id,
      kind = %enrollment.offering.kind(),
      "enrolled student"
    );
    Ok(enrollment)
  }

  async fn list_enrollments_for_student(
    &self,
    student_id: &str,
  ) -> Result<Vec<Enrollment>> {
    let student_id = student_id.to_owned();
    let raws = self
      .conn
      .call(move |conn| ledger::enrollments_for_student(conn, &student_id))
      .await?;
    decode_all(raws, |r| r.into_enrollment())
  }

  async fn list_enrollments_for_offering(
    &self,
    offering: &Offering,
  ) -> Result<Vec<Enrollment>> {
    let offering = offering.clone();
    let raws = self
      .conn
      .call(move |conn| ledger::enrollments_for_offering(conn, &offering))
      .await?;
    decode_all(raws, |r| r.into_enrollment())
  }

  // ── Grades ────────────────────────────────────────────────────────────────

  async fn get_grades_for_subject(&self, subject_code: &str) -> Result<Vec<Grade>> {
    let code = subject_code.to_owned();
    let at = now();
    let (raws, created) = self
      .conn
      .call(move |conn| ledger::grades_for_subject(conn, &code, at))
      .await?;
    if created > 0 {
      tracing::info!(subject = subject_code, created, "backfilled grade placeholders");
    }
    decode_all(raws, RawGrade::into_grade)
  }

  async fn set_final_score(
    &self,
    student_id: String,
    subject_code: String,
    score: Option<f64>,
  ) -> Result<Grade> {
    let score = Score::new_optional(score)?;
    let at = now();
    let grade = self
      .conn
      .call(move |conn| {
        ledger::write_grade(
          conn,
          &student_id,
          &subject_code,
          GradeEdit::FinalScore(score),
          at,
        )
      })
      .await?;
    tracing::info!(
      student_id = grade.student_id(),
      subject = grade.subject_code(),
      status = %grade.status(),
      "set final score"
    );
    Ok(grade)
  }

  async fn update_grade(
    &self,
    student_id: String,
    subject_code: String,
    update: GradeUpdate,
  ) -> Result<Grade> {
    let at = now();
    let grade = self
      .conn
      .call(move |conn| {
        ledger::write_grade(conn, &student_id, &subject_code, GradeEdit::Form(update), at)
      })
      .await?;
    tracing::info!(
      student_id = grade.student_id(),
      subject = grade.subject_code(),
      status = %grade.status(),
      "updated grade"
    );
    Ok(grade)
  }

  async fn list_grades_for_student(&self, student_id: &str) -> Result<Vec<Grade>> {
    let student_id = student_id.to_owned();
    let raws = self
      .conn
      .call(move |conn| ledger::grades_for_student(conn, &student_id))
      .await?;
    decode_all(raws, RawGrade::into_grade)
  }

  // ── Certificates ──────────────────────────────────────────────────────────

  async fn regular_certificate(
    &self,
    user_id: Uuid,
    issued_on: NaiveDate,
  ) -> Result<RegularCertificate> {
    let id_str = encode_uuid(user_id);
    let rows = self
      .conn
      .call(move |conn| people::certificate_rows(conn, &id_str))
      .await?;
    let user = rows.user.into_user()?;
    let student = rows.student.into_student()?;
    let faculty = rows.faculty.map(RawFaculty::into_faculty).transpose()?;
    tracing::info!(user_id = %user_id, student_id = %student.student_id, "issued regular certificate");
    Ok(RegularCertificate::new(
      &user,
      &student,
      rows.career.as_ref(),
      faculty.as_ref(),
      issued_on,
    ))
  }
}

//! The `AcademicStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `aula-store-sqlite`).
//! Higher layers (`aula-api`, `aula-server`) depend on this abstraction, not
//! on any concrete backend.
//!
//! Every multi-step operation (enroll plus grade placeholder, backfill plus
//! read, assignment replacement, guarded delete) must be atomic in the
//! backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  access::Role,
  catalog::{CatalogSummary, Career, Faculty, FinalExam, NewFinalExam, Subject},
  certificate::RegularCertificate,
  enrollment::{Enrollment, Offering},
  grade::{Grade, GradeUpdate},
  people::{
    AssignmentChange, Credentials, NewUser, Professor, Student, User, UserUpdate,
  },
};

/// Abstraction over an academic records backend.
///
/// Backend errors must convert into [`crate::Error`] so callers can tell
/// validation failures from missing entities and storage faults.
pub trait AcademicStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Health ────────────────────────────────────────────────────────────

  /// Run a trivial query against the backend.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Faculties ─────────────────────────────────────────────────────────

  fn create_faculty(
    &self,
    faculty: Faculty,
  ) -> impl Future<Output = Result<Faculty, Self::Error>> + Send + '_;

  fn get_faculty<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Faculty>, Self::Error>> + Send + 'a;

  fn list_faculties(
    &self,
  ) -> impl Future<Output = Result<Vec<Faculty>, Self::Error>> + Send + '_;

  /// Replace every field of an existing faculty.
  fn update_faculty(
    &self,
    faculty: Faculty,
  ) -> impl Future<Output = Result<Faculty, Self::Error>> + Send + '_;

  /// Refused while the faculty still has careers.
  fn delete_faculty<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Careers ───────────────────────────────────────────────────────────

  fn create_career(
    &self,
    career: Career,
  ) -> impl Future<Output = Result<Career, Self::Error>> + Send + '_;

  fn get_career<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Career>, Self::Error>> + Send + 'a;

  fn list_careers(
    &self,
    faculty_code: Option<String>,
  ) -> impl Future<Output = Result<Vec<Career>, Self::Error>> + Send + '_;

  fn update_career(
    &self,
    career: Career,
  ) -> impl Future<Output = Result<Career, Self::Error>> + Send + '_;

  /// Refused while the career still has students or subjects.
  fn delete_career<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn create_subject(
    &self,
    subject: Subject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  fn list_subjects(
    &self,
    career_code: Option<String>,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  fn update_subject(
    &self,
    subject: Subject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Refused while the subject still has enrollments or final exams.
  fn delete_subject<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Final exams ───────────────────────────────────────────────────────

  fn create_final_exam(
    &self,
    exam: NewFinalExam,
  ) -> impl Future<Output = Result<FinalExam, Self::Error>> + Send + '_;

  fn get_final_exam(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FinalExam>, Self::Error>> + Send + '_;

  fn list_final_exams(
    &self,
    subject_code: Option<String>,
  ) -> impl Future<Output = Result<Vec<FinalExam>, Self::Error>> + Send + '_;

  fn update_final_exam(
    &self,
    exam: FinalExam,
  ) -> impl Future<Output = Result<FinalExam, Self::Error>> + Send + '_;

  /// Refused while the final exam still has enrollments.
  fn delete_final_exam(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Entity counts for the administrator dashboard.
  fn catalog_summary(
    &self,
  ) -> impl Future<Output = Result<CatalogSummary, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Replace a user's names, email and dni, and the password hash when one
  /// is given.
  fn update_user(
    &self,
    id: Uuid,
    update: UserUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by username.
  fn find_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Inactive users can no longer authenticate. Users are never deleted.
  fn set_user_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// The user must exist, carry [`Role::Student`], and have no profile yet.
  fn create_student(
    &self,
    student: Student,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn get_student<'a>(
    &'a self,
    student_id: &'a str,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  fn student_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  fn list_students(
    &self,
    career_code: Option<String>,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// The user must exist, carry [`Role::Professor`], and have no profile
  /// yet.
  fn create_professor(
    &self,
    professor: Professor,
  ) -> impl Future<Output = Result<Professor, Self::Error>> + Send + '_;

  fn get_professor<'a>(
    &'a self,
    professor_id: &'a str,
  ) -> impl Future<Output = Result<Option<Professor>, Self::Error>> + Send + 'a;

  fn professor_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Professor>, Self::Error>> + Send + '_;

  fn list_professors(
    &self,
  ) -> impl Future<Output = Result<Vec<Professor>, Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  /// Replace the set of professors assigned to a subject.
  fn assign_subject_professors(
    &self,
    subject_code: String,
    professor_ids: Vec<String>,
  ) -> impl Future<Output = Result<AssignmentChange, Self::Error>> + Send + '_;

  /// Replace the set of professors assigned to a final exam.
  fn assign_final_exam_professors(
    &self,
    final_exam_id: Uuid,
    professor_ids: Vec<String>,
  ) -> impl Future<Output = Result<AssignmentChange, Self::Error>> + Send + '_;

  fn subjects_for_professor<'a>(
    &'a self,
    professor_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + 'a;

  fn final_exams_for_professor<'a>(
    &'a self,
    professor_id: &'a str,
  ) -> impl Future<Output = Result<Vec<FinalExam>, Self::Error>> + Send + 'a;

  fn is_assigned_to_subject<'a>(
    &'a self,
    professor_id: &'a str,
    subject_code: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn is_assigned_to_final_exam<'a>(
    &'a self,
    professor_id: &'a str,
    final_exam_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Enrollments ───────────────────────────────────────────────────────

  /// Enroll a student in an offering.
  ///
  /// Fails with a validation error on a duplicate enrollment, or when a
  /// subject does not belong to the student's career. A subject enrollment
  /// creates the grade placeholder in the same transaction.
  fn enroll(
    &self,
    student_id: String,
    offering: Offering,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  fn list_enrollments_for_student<'a>(
    &'a self,
    student_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + 'a;

  fn list_enrollments_for_offering<'a>(
    &'a self,
    offering: &'a Offering,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + 'a;

  // ── Grades ────────────────────────────────────────────────────────────

  /// One grade per student enrolled in the subject, ordered by student
  /// name. Missing grade rows are created (status free) before returning;
  /// a second call creates nothing.
  fn get_grades_for_subject<'a>(
    &'a self,
    subject_code: &'a str,
  ) -> impl Future<Output = Result<Vec<Grade>, Self::Error>> + Send + 'a;

  /// Upsert the final score of an enrolled student and recompute the
  /// status. `None` clears the score.
  fn set_final_score(
    &self,
    student_id: String,
    subject_code: String,
    score: Option<f64>,
  ) -> impl Future<Output = Result<Grade, Self::Error>> + Send + '_;

  /// Apply a full grade-form edit for an enrolled student.
  fn update_grade(
    &self,
    student_id: String,
    subject_code: String,
    update: GradeUpdate,
  ) -> impl Future<Output = Result<Grade, Self::Error>> + Send + '_;

  fn list_grades_for_student<'a>(
    &'a self,
    student_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Grade>, Self::Error>> + Send + 'a;

  // ── Certificates ──────────────────────────────────────────────────────

  /// The regular-student certificate of a user, read in one snapshot.
  /// Fails with a validation error when the user has no student profile.
  fn regular_certificate(
    &self,
    user_id: Uuid,
    issued_on: NaiveDate,
  ) -> impl Future<Output = Result<RegularCertificate, Self::Error>> + Send + '_;
}

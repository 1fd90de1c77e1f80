//! Integration tests for `SqliteStore` against an in-memory database.

use aula_core::{
  Error as CoreError,
  access::Role,
  catalog::{Career, Faculty, NewFinalExam, Period, Subject, SubjectCategory},
  enrollment::Offering,
  grade::{GradeStatus, GradeUpdate, Score},
  people::{NewUser, Professor, ProfessorCategory, Student, UserUpdate},
  store::AcademicStore,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn is_validation(e: &Error) -> bool { matches!(e, Error::Core(CoreError::Validation(_))) }

fn is_not_found(e: &Error) -> bool {
  matches!(e, Error::Core(CoreError::NotFound { .. }))
}

fn faculty(code: &str) -> Faculty {
  Faculty {
    code:        code.into(),
    name:        format!("Faculty {code}"),
    address:     "Av. Siempre Viva 742".into(),
    phone:       "555-0100".into(),
    email:       "info@example.edu".into(),
    website:     "https://example.edu".into(),
    dean:        "Dr. Dean".into(),
    established: date(1950, 3, 1),
    description: None,
  }
}

fn career(code: &str, faculty: &str) -> Career {
  Career {
    code:           code.into(),
    name:           format!("Career {code}"),
    faculty_code:   faculty.into(),
    director:       "Director".into(),
    duration_years: 5,
    description:    None,
  }
}

fn subject(code: &str, career: &str) -> Subject {
  Subject {
    code:         code.into(),
    name:         format!("Subject {code}"),
    career_code:  career.into(),
    year:         1,
    category:     SubjectCategory::Obligatory,
    period:       Period::First,
    weekly_hours: 6,
    description:  None,
  }
}

fn final_exam(subject: &str) -> NewFinalExam {
  NewFinalExam {
    subject_code:     subject.into(),
    date:             date(2024, 12, 10),
    location:         "Aula Magna".into(),
    duration_minutes: 120,
    call_number:      1,
    notes:            None,
  }
}

fn new_user(username: &str, first: &str, last: &str, role: Role) -> NewUser {
  NewUser {
    username:      username.into(),
    first_name:    first.into(),
    last_name:     last.into(),
    email:         format!("{username}@example.edu"),
    dni:           None,
    role,
    password_hash: "$argon2id$not-a-real-hash".into(),
  }
}

/// Faculty FI with careers ISI (subjects PRG, ALG) and MED (subject ANA).
async fn catalog() -> SqliteStore {
  let s = store().await;
  s.create_faculty(faculty("FI")).await.unwrap();
  s.create_career(career("ISI", "FI")).await.unwrap();
  s.create_career(career("MED", "FI")).await.unwrap();
  s.create_subject(subject("PRG", "ISI")).await.unwrap();
  s.create_subject(subject("ALG", "ISI")).await.unwrap();
  s.create_subject(subject("ANA", "MED")).await.unwrap();
  s
}

async fn add_student(
  s: &SqliteStore,
  student_id: &str,
  first: &str,
  last: &str,
  career: Option<&str>,
) -> Student {
  let user = s
    .create_user(new_user(
      &student_id.to_lowercase(),
      first,
      last,
      Role::Student,
    ))
    .await
    .unwrap();
  s.create_student(Student {
    student_id:      student_id.into(),
    user_id:         user.user_id,
    career_code:     career.map(str::to_owned),
    enrollment_date: date(2024, 3, 1),
  })
  .await
  .unwrap()
}

async fn add_professor(s: &SqliteStore, professor_id: &str) -> Professor {
  let user = s
    .create_user(new_user(
      &professor_id.to_lowercase(),
      "Ada",
      professor_id,
      Role::Professor,
    ))
    .await
    .unwrap();
  s.create_professor(Professor {
    professor_id: professor_id.into(),
    user_id:      user.user_id,
    degree:       "PhD".into(),
    category:     ProfessorCategory::Adjunct,
    hire_date:    date(2010, 8, 1),
  })
  .await
  .unwrap()
}

fn score(v: f64) -> Score { Score::new(v).unwrap() }

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_succeeds() {
  store().await.ping().await.unwrap();
}

#[tokio::test]
async fn faculty_crud_roundtrip() {
  let s = store().await;
  let created = s.create_faculty(faculty("FI")).await.unwrap();
  assert_eq!(s.get_faculty("FI").await.unwrap(), Some(created.clone()));

  let mut edited = created;
  edited.dean = "Dr. New Dean".into();
  s.update_faculty(edited.clone()).await.unwrap();
  assert_eq!(s.get_faculty("FI").await.unwrap(), Some(edited));

  s.delete_faculty("FI").await.unwrap();
  assert!(s.get_faculty("FI").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_faculty_code_is_a_validation_error() {
  let s = store().await;
  s.create_faculty(faculty("FI")).await.unwrap();
  let err = s.create_faculty(faculty("FI")).await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn update_missing_faculty_is_not_found() {
  let s = store().await;
  let err = s.update_faculty(faculty("XX")).await.unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

#[tokio::test]
async fn career_requires_existing_faculty() {
  let s = store().await;
  let err = s.create_career(career("ISI", "NOPE")).await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn list_filters_by_parent() {
  let s = catalog().await;
  assert_eq!(s.list_careers(None).await.unwrap().len(), 2);
  assert_eq!(s.list_careers(Some("FI".into())).await.unwrap().len(), 2);
  assert!(s.list_careers(Some("XX".into())).await.unwrap().is_empty());

  let isi: Vec<_> = s
    .list_subjects(Some("ISI".into()))
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.code)
    .collect();
  assert_eq!(isi.len(), 2);
  assert!(isi.contains(&"PRG".to_owned()) && isi.contains(&"ALG".to_owned()));
}

#[tokio::test]
async fn delete_faculty_with_careers_is_refused() {
  let s = catalog().await;
  let err = s.delete_faculty("FI").await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
  assert!(s.get_faculty("FI").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_career_with_subjects_or_students_is_refused() {
  let s = catalog().await;
  let err = s.delete_career("ISI").await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");

  s.create_career(career("ARQ", "FI")).await.unwrap();
  add_student(&s, "S1", "Ana", "Diaz", Some("ARQ")).await;
  let err = s.delete_career("ARQ").await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn delete_subject_with_enrollments_or_finals_is_refused() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("PRG")).await.unwrap();
  let err = s.delete_subject("PRG").await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");

  s.create_final_exam(final_exam("ALG")).await.unwrap();
  let err = s.delete_subject("ALG").await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");

  s.delete_subject("ANA").await.unwrap();
}

#[tokio::test]
async fn delete_missing_subject_is_not_found() {
  let s = catalog().await;
  let err = s.delete_subject("NOPE").await.unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

#[tokio::test]
async fn final_exam_lifecycle() {
  let s = catalog().await;
  let exam = s.create_final_exam(final_exam("PRG")).await.unwrap();
  assert_eq!(
    s.get_final_exam(exam.final_exam_id).await.unwrap(),
    Some(exam.clone())
  );
  assert_eq!(s.list_final_exams(Some("PRG".into())).await.unwrap().len(), 1);
  assert!(s.list_final_exams(Some("ALG".into())).await.unwrap().is_empty());

  let mut moved = exam.clone();
  moved.location = "Lab 3".into();
  s.update_final_exam(moved.clone()).await.unwrap();
  assert_eq!(s.get_final_exam(exam.final_exam_id).await.unwrap(), Some(moved));

  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::final_exam(exam.final_exam_id))
    .await
    .unwrap();
  let err = s.delete_final_exam(exam.final_exam_id).await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn final_exam_for_unknown_subject_is_rejected() {
  let s = catalog().await;
  let err = s.create_final_exam(final_exam("NOPE")).await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn catalog_summary_counts_entities() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  add_professor(&s, "P1").await;
  s.create_final_exam(final_exam("PRG")).await.unwrap();

  let summary = s.catalog_summary().await.unwrap();
  assert_eq!(summary.faculties, 1);
  assert_eq!(summary.careers, 2);
  assert_eq!(summary.subjects, 3);
  assert_eq!(summary.final_exams, 1);
  assert_eq!(summary.students, 1);
  assert_eq!(summary.professors, 1);
}

// ─── Users and profiles ──────────────────────────────────────────────────────

#[tokio::test]
async fn credentials_lookup_by_username() {
  let s = store().await;
  let user = s
    .create_user(new_user("ana", "Ana", "Diaz", Role::Student))
    .await
    .unwrap();
  assert!(user.is_active);

  let creds = s.find_credentials("ana").await.unwrap().unwrap();
  assert_eq!(creds.user, user);
  assert_eq!(creds.password_hash, "$argon2id$not-a-real-hash");
  assert!(s.find_credentials("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  s.create_user(new_user("ana", "Ana", "Diaz", Role::Student))
    .await
    .unwrap();
  let err = s
    .create_user(new_user("ana", "Ana", "Other", Role::Professor))
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn deactivation_is_persisted() {
  let s = store().await;
  let user = s
    .create_user(new_user("ana", "Ana", "Diaz", Role::Student))
    .await
    .unwrap();
  let updated = s.set_user_active(user.user_id, false).await.unwrap();
  assert!(!updated.is_active);
  assert!(!s.get_user(user.user_id).await.unwrap().unwrap().is_active);

  let err = s.set_user_active(Uuid::new_v4(), false).await.unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

#[tokio::test]
async fn list_users_filters_by_role() {
  let s = store().await;
  s.create_user(new_user("ana", "Ana", "Diaz", Role::Student))
    .await
    .unwrap();
  s.create_user(new_user("prof", "Ada", "Lovelace", Role::Professor))
    .await
    .unwrap();
  assert_eq!(s.list_users(None).await.unwrap().len(), 2);
  let profs = s.list_users(Some(Role::Professor)).await.unwrap();
  assert_eq!(profs.len(), 1);
  assert_eq!(profs[0].username, "prof");
}

#[tokio::test]
async fn student_profile_requires_student_role() {
  let s = catalog().await;
  let prof = s
    .create_user(new_user("prof", "Ada", "Lovelace", Role::Professor))
    .await
    .unwrap();
  let err = s
    .create_student(Student {
      student_id:      "S1".into(),
      user_id:         prof.user_id,
      career_code:     Some("ISI".into()),
      enrollment_date: date(2024, 3, 1),
    })
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn one_student_profile_per_user() {
  let s = catalog().await;
  let student = add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  let err = s
    .create_student(Student {
      student_id:      "S2".into(),
      user_id:         student.user_id,
      career_code:     None,
      enrollment_date: date(2024, 3, 1),
    })
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
  assert_eq!(
    s.student_for_user(student.user_id).await.unwrap(),
    Some(student)
  );
}

#[tokio::test]
async fn user_update_keeps_role_and_password_when_omitted() {
  let s = store().await;
  let user = s
    .create_user(new_user("ana", "Ana", "Diaz", Role::Student))
    .await
    .unwrap();
  let updated = s
    .update_user(user.user_id, UserUpdate {
      first_name:    "Ana María".into(),
      last_name:     "Díaz".into(),
      email:         "ana.diaz@example.edu".into(),
      dni:           Some("30111222".into()),
      password_hash: None,
    })
    .await
    .unwrap();
  assert_eq!(updated.first_name, "Ana María");
  assert_eq!(updated.dni.as_deref(), Some("30111222"));
  assert_eq!(updated.role, Role::Student);
  assert_eq!(updated.username, "ana");

  let creds = s.find_credentials("ana").await.unwrap().unwrap();
  assert_eq!(creds.user, updated);
  assert_eq!(creds.password_hash, "$argon2id$not-a-real-hash");
}

#[tokio::test]
async fn user_update_replaces_password_hash() {
  let s = store().await;
  let user = s
    .create_user(new_user("ana", "Ana", "Diaz", Role::Student))
    .await
    .unwrap();
  s.update_user(user.user_id, UserUpdate {
    first_name:    "Ana".into(),
    last_name:     "Diaz".into(),
    email:         "ana@example.edu".into(),
    dni:           None,
    password_hash: Some("$argon2id$another-hash".into()),
  })
  .await
  .unwrap();
  let creds = s.find_credentials("ana").await.unwrap().unwrap();
  assert_eq!(creds.password_hash, "$argon2id$another-hash");
}

#[tokio::test]
async fn dni_is_unique_across_users() {
  let s = store().await;
  let mut first = new_user("ana", "Ana", "Diaz", Role::Student);
  first.dni = Some("30111222".into());
  let ana = s.create_user(first).await.unwrap();

  let mut second = new_user("bea", "Bea", "Diaz", Role::Student);
  second.dni = Some("30111222".into());
  let err = s.create_user(second).await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");

  let bea = s
    .create_user(new_user("bea", "Bea", "Diaz", Role::Student))
    .await
    .unwrap();
  let taken = UserUpdate {
    first_name:    "Bea".into(),
    last_name:     "Diaz".into(),
    email:         "bea@example.edu".into(),
    dni:           Some("30111222".into()),
    password_hash: None,
  };
  let err = s.update_user(bea.user_id, taken).await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");

  // Re-saving a user's own dni is fine.
  let own = UserUpdate {
    first_name:    "Ana".into(),
    last_name:     "Diaz".into(),
    email:         "ana@example.edu".into(),
    dni:           Some("30111222".into()),
    password_hash: None,
  };
  s.update_user(ana.user_id, own).await.unwrap();
}

#[tokio::test]
async fn update_missing_user_is_not_found() {
  let s = store().await;
  let err = s
    .update_user(Uuid::new_v4(), UserUpdate {
      first_name:    "Ana".into(),
      last_name:     "Diaz".into(),
      email:         "ana@example.edu".into(),
      dni:           None,
      password_hash: None,
    })
    .await
    .unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn assignment_replacement_reports_difference() {
  let s = catalog().await;
  for id in ["P1", "P2", "P3"] {
    add_professor(&s, id).await;
  }

  let first = s
    .assign_subject_professors("PRG".into(), vec!["P1".into(), "P2".into()])
    .await
    .unwrap();
  assert_eq!(first.added, vec!["P1".to_owned(), "P2".to_owned()]);
  assert!(first.removed.is_empty());

  let second = s
    .assign_subject_professors("PRG".into(), vec!["P2".into(), "P3".into()])
    .await
    .unwrap();
  assert_eq!(second.added, vec!["P3".to_owned()]);
  assert_eq!(second.removed, vec!["P1".to_owned()]);

  assert!(!s.is_assigned_to_subject("P1", "PRG").await.unwrap());
  assert!(s.is_assigned_to_subject("P3", "PRG").await.unwrap());
  let subjects = s.subjects_for_professor("P2").await.unwrap();
  assert_eq!(subjects.len(), 1);
  assert_eq!(subjects[0].code, "PRG");

  let unchanged = s
    .assign_subject_professors("PRG".into(), vec!["P3".into(), "P2".into()])
    .await
    .unwrap();
  assert!(!unchanged.changed());
}

#[tokio::test]
async fn assignment_with_unknown_professor_changes_nothing() {
  let s = catalog().await;
  add_professor(&s, "P1").await;
  s.assign_subject_professors("PRG".into(), vec!["P1".into()])
    .await
    .unwrap();

  let err = s
    .assign_subject_professors("PRG".into(), vec!["GHOST".into()])
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
  assert!(s.is_assigned_to_subject("P1", "PRG").await.unwrap());
}

#[tokio::test]
async fn final_exam_assignments() {
  let s = catalog().await;
  add_professor(&s, "P1").await;
  let exam = s.create_final_exam(final_exam("PRG")).await.unwrap();

  s.assign_final_exam_professors(exam.final_exam_id, vec!["P1".into()])
    .await
    .unwrap();
  assert!(s
    .is_assigned_to_final_exam("P1", exam.final_exam_id)
    .await
    .unwrap());
  assert_eq!(s.final_exams_for_professor("P1").await.unwrap(), vec![exam]);

  let err = s
    .assign_final_exam_professors(Uuid::new_v4(), vec!["P1".into()])
    .await
    .unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

// ─── Enrollments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn enroll_in_subject_creates_free_placeholder() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;

  let enrollment = s.enroll("S1".into(), Offering::subject("PRG")).await.unwrap();
  assert_eq!(enrollment.offering, Offering::subject("PRG"));

  let grades = s.list_grades_for_student("S1").await.unwrap();
  assert_eq!(grades.len(), 1);
  assert_eq!(grades[0].subject_code(), "PRG");
  assert_eq!(grades[0].status(), GradeStatus::Free);
  assert!(grades[0].final_score().is_none());
}

#[tokio::test]
async fn duplicate_enrollment_is_rejected() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("PRG")).await.unwrap();

  let err = s
    .enroll("S1".into(), Offering::subject("PRG"))
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
  assert_eq!(s.list_enrollments_for_student("S1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn enrollment_outside_career_is_rejected() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  let err = s
    .enroll("S1".into(), Offering::subject("ANA"))
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
  assert!(s.list_grades_for_student("S1").await.unwrap().is_empty());
}

#[tokio::test]
async fn student_without_career_cannot_enroll_in_subjects() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", None).await;
  let err = s
    .enroll("S1".into(), Offering::subject("PRG"))
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
}

#[tokio::test]
async fn enroll_unknown_student_or_offering_is_not_found() {
  let s = catalog().await;
  let err = s
    .enroll("GHOST".into(), Offering::subject("PRG"))
    .await
    .unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");

  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  let err = s
    .enroll("S1".into(), Offering::final_exam(Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

#[tokio::test]
async fn final_exam_enrollment_and_roster() {
  let s = catalog().await;
  add_student(&s, "S1", "Zoe", "Zapata", Some("ISI")).await;
  add_student(&s, "S2", "Ana", "Alvarez", Some("MED")).await;
  let exam = s.create_final_exam(final_exam("PRG")).await.unwrap();
  let offering = Offering::final_exam(exam.final_exam_id);

  s.enroll("S1".into(), offering.clone()).await.unwrap();
  s.enroll("S2".into(), offering.clone()).await.unwrap();
  let err = s.enroll("S1".into(), offering.clone()).await.unwrap_err();
  assert!(is_validation(&err), "got {err:?}");

  let roster: Vec<_> = s
    .list_enrollments_for_offering(&offering)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.student_id)
    .collect();
  assert_eq!(roster, vec!["S2".to_owned(), "S1".to_owned()]);

  // Final exam enrollments never create grade rows.
  assert!(s.list_grades_for_student("S1").await.unwrap().is_empty());
}

#[tokio::test]
async fn enrollments_for_student_cover_both_kinds() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  let exam = s.create_final_exam(final_exam("ALG")).await.unwrap();
  s.enroll("S1".into(), Offering::subject("PRG")).await.unwrap();
  s.enroll("S1".into(), Offering::final_exam(exam.final_exam_id))
    .await
    .unwrap();

  let offerings: Vec<_> = s
    .list_enrollments_for_student("S1")
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.offering)
    .collect();
  assert_eq!(offerings, vec![
    Offering::subject("PRG"),
    Offering::final_exam(exam.final_exam_id),
  ]);
}

#[tokio::test]
async fn roster_of_unknown_offering_is_not_found() {
  let s = catalog().await;
  let err = s
    .list_enrollments_for_offering(&Offering::subject("NOPE"))
    .await
    .unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

// ─── Grades ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn grades_read_backfills_missing_rows_once() {
  let s = catalog().await;
  add_student(&s, "S1", "Carla", "Gomez", Some("ISI")).await;
  add_student(&s, "S2", "Bruno", "Alvarez", Some("ISI")).await;
  add_student(&s, "S3", "Ana", "Alvarez", Some("ISI")).await;
  for id in ["S1", "S2", "S3"] {
    s.enroll(id.into(), Offering::subject("PRG")).await.unwrap();
  }
  // Simulate enrollments recorded before grades were tracked.
  s.execute_batch("DELETE FROM grades").await.unwrap();
  assert!(s.list_grades_for_student("S1").await.unwrap().is_empty());

  let grades = s.get_grades_for_subject("PRG").await.unwrap();
  let order: Vec<_> = grades.iter().map(|g| g.student_id()).collect();
  assert_eq!(order, vec!["S3", "S2", "S1"]);
  assert!(grades.iter().all(|g| g.status() == GradeStatus::Free));

  // Persisted, so a second read sees the same rows and creates nothing.
  assert_eq!(s.list_grades_for_student("S1").await.unwrap().len(), 1);
  let again = s.get_grades_for_subject("PRG").await.unwrap();
  assert_eq!(again, grades);
}

#[tokio::test]
async fn backfill_keeps_existing_scores() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  add_student(&s, "S2", "Bea", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("ALG")).await.unwrap();
  s.enroll("S2".into(), Offering::subject("ALG")).await.unwrap();
  s.set_final_score("S1".into(), "ALG".into(), Some(8.0))
    .await
    .unwrap();
  s.execute_batch("DELETE FROM grades WHERE student_id = 'S2'")
    .await
    .unwrap();

  let grades = s.get_grades_for_subject("ALG").await.unwrap();
  assert_eq!(grades.len(), 2);
  assert_eq!(grades[0].status(), GradeStatus::Promoted);
  assert_eq!(grades[0].final_score(), Some(score(8.0)));
  assert_eq!(grades[1].status(), GradeStatus::Free);
}

#[tokio::test]
async fn grades_of_unknown_subject_is_not_found() {
  let s = catalog().await;
  let err = s.get_grades_for_subject("NOPE").await.unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

#[tokio::test]
async fn grades_of_subject_without_enrollments_is_empty() {
  let s = catalog().await;
  assert!(s.get_grades_for_subject("PRG").await.unwrap().is_empty());
}

#[tokio::test]
async fn final_score_drives_status() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("ALG")).await.unwrap();

  let promoted = s
    .set_final_score("S1".into(), "ALG".into(), Some(7.5))
    .await
    .unwrap();
  assert_eq!(promoted.status(), GradeStatus::Promoted);

  let regular = s
    .set_final_score("S1".into(), "ALG".into(), Some(4.0))
    .await
    .unwrap();
  assert_eq!(regular.status(), GradeStatus::Regular);
  assert!(regular.last_updated() > promoted.last_updated());

  let stored = s.get_grades_for_subject("ALG").await.unwrap();
  assert_eq!(stored, vec![regular.clone()]);

  let cleared = s
    .set_final_score("S1".into(), "ALG".into(), None)
    .await
    .unwrap();
  assert_eq!(cleared.status(), GradeStatus::Free);
  assert!(cleared.last_updated() > regular.last_updated());
}

#[tokio::test]
async fn threshold_is_inclusive() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("ALG")).await.unwrap();

  let at = s
    .set_final_score("S1".into(), "ALG".into(), Some(6.0))
    .await
    .unwrap();
  assert_eq!(at.status(), GradeStatus::Promoted);
  let below = s
    .set_final_score("S1".into(), "ALG".into(), Some(5.99))
    .await
    .unwrap();
  assert_eq!(below.status(), GradeStatus::Regular);
}

#[tokio::test]
async fn final_score_without_enrollment_writes_nothing() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  let err = s
    .set_final_score("S1".into(), "PRG".into(), Some(9.0))
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");
  assert!(s.list_grades_for_student("S1").await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_score_is_rejected() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("ALG")).await.unwrap();
  for bad in [-0.5, 10.5, f64::NAN] {
    let err = s
      .set_final_score("S1".into(), "ALG".into(), Some(bad))
      .await
      .unwrap_err();
    assert!(is_validation(&err), "{bad}: got {err:?}");
  }
  let grades = s.list_grades_for_student("S1").await.unwrap();
  assert_eq!(grades[0].status(), GradeStatus::Free);
}

#[tokio::test]
async fn grade_form_update_writes_every_field() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("PRG")).await.unwrap();

  let grade = s
    .update_grade("S1".into(), "PRG".into(), GradeUpdate {
      promotion_score: Some(score(8.0)),
      final_score:     Some(score(5.0)),
      notes:           Some("recovered in december".into()),
    })
    .await
    .unwrap();
  assert_eq!(grade.status(), GradeStatus::Regular);
  assert_eq!(grade.promotion_score(), Some(score(8.0)));
  assert_eq!(grade.notes(), Some("recovered in december"));

  let stored = s.list_grades_for_student("S1").await.unwrap();
  assert_eq!(stored, vec![grade]);
}

#[tokio::test]
async fn database_rejects_inconsistent_status() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("PRG")).await.unwrap();
  let result = s
    .execute_batch(
      "UPDATE grades SET final_score = 9.0, status = 'free' WHERE student_id = 'S1'",
    )
    .await;
  assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn database_rejects_grade_without_enrollment() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  let result = s
    .execute_batch(
      "INSERT INTO grades (student_id, subject_code, status, last_updated)
       VALUES ('S1', 'PRG', 'free', '2024-01-01T00:00:00.000000Z')",
    )
    .await;
  assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn simultaneous_grade_writes_keep_one_row_per_student() {
  let s = catalog().await;
  add_student(&s, "S1", "Ana", "Diaz", Some("ISI")).await;
  add_student(&s, "S2", "Bea", "Diaz", Some("ISI")).await;
  s.enroll("S1".into(), Offering::subject("PRG")).await.unwrap();
  s.enroll("S2".into(), Offering::subject("PRG")).await.unwrap();
  s.execute_batch("DELETE FROM grades").await.unwrap();

  let (a, b) = tokio::join!(
    s.get_grades_for_subject("PRG"),
    s.get_grades_for_subject("PRG"),
  );
  assert_eq!(a.unwrap().len(), 2);
  assert_eq!(b.unwrap().len(), 2);

  let (a, b) = tokio::join!(
    s.set_final_score("S1".into(), "PRG".into(), Some(7.0)),
    s.set_final_score("S1".into(), "PRG".into(), Some(3.0)),
  );
  a.unwrap();
  b.unwrap();

  for student in ["S1", "S2"] {
    let grades = s.list_grades_for_student(student).await.unwrap();
    assert_eq!(grades.len(), 1, "{student}");
  }
  let s1 = s.list_grades_for_student("S1").await.unwrap().remove(0);
  assert!(
    matches!(s1.status(), GradeStatus::Promoted | GradeStatus::Regular),
    "got {:?}",
    s1.status()
  );
  assert_eq!(s.get_grades_for_subject("PRG").await.unwrap().len(), 2);
}

// ─── Certificates ────────────────────────────────────────────────────────────

#[tokio::test]
async fn certificate_collects_career_and_faculty() {
  let s = catalog().await;
  let mut user = new_user("ana", "Ana", "Diaz", Role::Student);
  user.dni = Some("30111222".into());
  let user = s.create_user(user).await.unwrap();
  s.create_student(Student {
    student_id:      "S1".into(),
    user_id:         user.user_id,
    career_code:     Some("ISI".into()),
    enrollment_date: date(2024, 3, 1),
  })
  .await
  .unwrap();

  let cert = s
    .regular_certificate(user.user_id, date(2025, 4, 7))
    .await
    .unwrap();
  assert_eq!(cert.full_name, "Ana Diaz");
  assert_eq!(cert.dni, "30111222");
  assert_eq!(cert.student_id, "S1");
  assert_eq!(cert.career_code, "ISI");
  assert_eq!(cert.faculty_name, "Faculty FI");
  assert_eq!(cert.enrollment_date, date(2024, 3, 1));
  assert_eq!(cert.filename, "certificado-regular-Diaz-20250407");
}

#[tokio::test]
async fn certificate_without_student_profile_is_a_validation_error() {
  let s = catalog().await;
  let user = s
    .create_user(new_user("ana", "Ana", "Diaz", Role::Student))
    .await
    .unwrap();
  let err = s
    .regular_certificate(user.user_id, date(2025, 4, 7))
    .await
    .unwrap_err();
  assert!(is_validation(&err), "got {err:?}");

  let err = s
    .regular_certificate(Uuid::new_v4(), date(2025, 4, 7))
    .await
    .unwrap_err();
  assert!(is_not_found(&err), "got {err:?}");
}

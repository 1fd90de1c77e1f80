//! Demo data set loaded by `--seed`.
//!
//! One faculty with two careers, a handful of subjects, two professors and
//! three students with enrollments and a few recorded grades. Every demo
//! account uses [`DEMO_PASSWORD`].

use anyhow::Context as _;
use aula_api::password::{Argon2Params, hash_password_with_params};
use aula_core::{
  access::Role,
  catalog::{Career, Faculty, NewFinalExam, Period, Subject, SubjectCategory},
  enrollment::Offering,
  people::{NewUser, Professor, ProfessorCategory, Student},
  store::AcademicStore,
};
use chrono::NaiveDate;

pub const DEMO_PASSWORD: &str = "demo";

const FACULTY: &str = "FI";

/// What [`load_demo`] inserted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedReport {
  pub users:       usize,
  pub subjects:    usize,
  pub enrollments: usize,
  pub grades:      usize,
}

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
  NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

fn subject(
  code: &str,
  name: &str,
  career: &str,
  year: u8,
  period: Period,
) -> Subject {
  Subject {
    code: code.into(),
    name: name.into(),
    career_code: career.into(),
    year,
    category: SubjectCategory::Obligatory,
    period,
    weekly_hours: 6,
    description: None,
  }
}

/// Insert the demo data set. Returns `None` without touching the store when
/// the demo faculty already exists.
pub async fn load_demo<S: AcademicStore>(
  store: &S,
  params: Argon2Params,
) -> anyhow::Result<Option<SeedReport>> {
  if store.get_faculty(FACULTY).await?.is_some() {
    tracing::info!("demo data already present, skipping seed");
    return Ok(None);
  }
  let mut report = SeedReport::default();

  // Catalog
  store
    .create_faculty(Faculty {
      code:        FACULTY.into(),
      name:        "Facultad de Ingeniería".into(),
      address:     "Av. Medrano 951".into(),
      phone:       "+54 11 4867-7500".into(),
      email:       "ingenieria@aula.example".into(),
      website:     "https://ingenieria.aula.example".into(),
      dean:        "Dra. Marta Ruiz".into(),
      established: date(1953, 8, 14)?,
      description: Some("Engineering and applied sciences".into()),
    })
    .await?;
  for (code, name, director) in [
    ("ISI", "Ingeniería en Sistemas", "Ing. Pablo Sosa"),
    ("IQ", "Ingeniería Química", "Dra. Elena Paz"),
  ] {
    store
      .create_career(Career {
        code:           code.into(),
        name:           name.into(),
        faculty_code:   FACULTY.into(),
        director:       director.into(),
        duration_years: 5,
        description:    None,
      })
      .await?;
  }
  for s in [
    subject("AM1", "Análisis Matemático I", "ISI", 1, Period::Annual),
    subject("ALG", "Álgebra y Geometría", "ISI", 1, Period::First),
    subject("PRG", "Programación I", "ISI", 1, Period::Second),
    subject("QG", "Química General", "IQ", 1, Period::Annual),
  ] {
    store.create_subject(s).await?;
    report.subjects += 1;
  }
  let prg_final = store
    .create_final_exam(NewFinalExam {
      subject_code:     "PRG".into(),
      date:             date(2024, 12, 10)?,
      location:         "Aula Magna".into(),
      duration_minutes: 180,
      call_number:      1,
      notes:            None,
    })
    .await?;

  // People
  let password_hash = hash_password_with_params(DEMO_PASSWORD, params)?;
  let users = [
    ("admin", "Ana", "Admin", None, Role::Administrator),
    ("mgarcia", "Mariano", "García", Some("20111222"), Role::Professor),
    ("jlopez", "Julia", "López", Some("22333444"), Role::Professor),
    ("lucia", "Lucía", "Fernández", Some("40123456"), Role::Student),
    ("tomas", "Tomás", "Benítez", Some("41234567"), Role::Student),
    ("sofia", "Sofía", "Martínez", Some("42345678"), Role::Student),
  ];
  let mut ids = Vec::with_capacity(users.len());
  for (username, first_name, last_name, dni, role) in users {
    let user = store
      .create_user(NewUser {
        username: username.into(),
        first_name: first_name.into(),
        last_name: last_name.into(),
        email: format!("{username}@aula.example"),
        dni: dni.map(Into::into),
        role,
        password_hash: password_hash.clone(),
      })
      .await?;
    ids.push(user.user_id);
  }
  report.users = ids.len();
  let [_, mgarcia, jlopez, lucia, tomas, sofia] = ids[..] else {
    anyhow::bail!("expected {} demo users", users.len());
  };

  for (professor_id, user_id, category) in [
    ("P-01", mgarcia, ProfessorCategory::Titular),
    ("P-02", jlopez, ProfessorCategory::Adjunct),
  ] {
    store
      .create_professor(Professor {
        professor_id: professor_id.into(),
        user_id,
        degree: "Ingeniero".into(),
        category,
        hire_date: date(2012, 3, 1)?,
      })
      .await?;
  }
  store
    .assign_subject_professors("ALG".into(), vec!["P-01".into()])
    .await?;
  store
    .assign_subject_professors("PRG".into(), vec!["P-01".into()])
    .await?;
  store
    .assign_subject_professors("AM1".into(), vec!["P-02".into()])
    .await?;
  store
    .assign_subject_professors("QG".into(), vec!["P-02".into()])
    .await?;
  store
    .assign_final_exam_professors(prg_final.final_exam_id, vec!["P-01".into()])
    .await?;

  for (student_id, user_id, career) in [
    ("S-1001", lucia, "ISI"),
    ("S-1002", tomas, "ISI"),
    ("S-1003", sofia, "IQ"),
  ] {
    store
      .create_student(Student {
        student_id:      student_id.into(),
        user_id,
        career_code:     Some(career.into()),
        enrollment_date: date(2024, 3, 1)?,
      })
      .await?;
  }

  // Enrollments and grades
  for (student_id, subject_code) in [
    ("S-1001", "AM1"),
    ("S-1001", "ALG"),
    ("S-1001", "PRG"),
    ("S-1002", "ALG"),
    ("S-1002", "PRG"),
    ("S-1003", "QG"),
  ] {
    store
      .enroll(student_id.into(), Offering::subject(subject_code))
      .await?;
    report.enrollments += 1;
  }
  for (student_id, subject_code, score) in [
    ("S-1001", "ALG", 7.5),
    ("S-1001", "PRG", 4.0),
    ("S-1002", "ALG", 5.0),
  ] {
    store
      .set_final_score(student_id.into(), subject_code.into(), Some(score))
      .await?;
    report.grades += 1;
  }

  tracing::info!(
    users = report.users,
    subjects = report.subjects,
    enrollments = report.enrollments,
    grades = report.grades,
    "loaded demo data"
  );
  Ok(Some(report))
}

//! SQL schema for the Aula SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Catalog ─────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS faculties (
    code        TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    address     TEXT NOT NULL,
    phone       TEXT NOT NULL,
    email       TEXT NOT NULL,
    website     TEXT NOT NULL,
    dean        TEXT NOT NULL,
    established TEXT NOT NULL,   -- YYYY-MM-DD
    description TEXT
);

CREATE TABLE IF NOT EXISTS careers (
    code           TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    faculty_code   TEXT NOT NULL REFERENCES faculties(code),
    director       TEXT NOT NULL,
    duration_years INTEGER NOT NULL CHECK (duration_years > 0),
    description    TEXT
);

CREATE TABLE IF NOT EXISTS subjects (
    code         TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    career_code  TEXT NOT NULL REFERENCES careers(code),
    year         INTEGER NOT NULL CHECK (year > 0),
    category     TEXT NOT NULL,   -- 'obligatory' | 'elective'
    period       TEXT NOT NULL,   -- 'first' | 'second' | 'annual'
    weekly_hours INTEGER NOT NULL CHECK (weekly_hours > 0),
    description  TEXT
);

CREATE TABLE IF NOT EXISTS final_exams (
    final_exam_id    TEXT PRIMARY KEY,
    subject_code     TEXT NOT NULL REFERENCES subjects(code),
    date             TEXT NOT NULL,
    location         TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
    call_number      INTEGER NOT NULL CHECK (call_number > 0),
    notes            TEXT
);

-- ── People ──────────────────────────────────────────────────────────────

-- Users are never deleted; deactivation is a flag.
CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    email         TEXT NOT NULL,
    dni           TEXT UNIQUE,
    role          TEXT NOT NULL,   -- 'administrator' | 'professor' | 'student'
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    student_id      TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL UNIQUE REFERENCES users(user_id),
    career_code     TEXT REFERENCES careers(code),
    enrollment_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS professors (
    professor_id TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL UNIQUE REFERENCES users(user_id),
    degree       TEXT NOT NULL,
    category     TEXT NOT NULL,   -- 'titular' | 'adjunct' | 'auxiliar'
    hire_date    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subject_professors (
    subject_code TEXT NOT NULL REFERENCES subjects(code) ON DELETE CASCADE,
    professor_id TEXT NOT NULL REFERENCES professors(professor_id),
    PRIMARY KEY (subject_code, professor_id)
);

CREATE TABLE IF NOT EXISTS final_exam_professors (
    final_exam_id TEXT NOT NULL REFERENCES final_exams(final_exam_id) ON DELETE CASCADE,
    professor_id  TEXT NOT NULL REFERENCES professors(professor_id),
    PRIMARY KEY (final_exam_id, professor_id)
);

-- ── Enrollments ─────────────────────────────────────────────────────────

-- Enrollments are immutable: no UPDATE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS subject_enrollments (
    enrollment_id TEXT PRIMARY KEY,
    student_id    TEXT NOT NULL REFERENCES students(student_id),
    subject_code  TEXT NOT NULL REFERENCES subjects(code),
    enrolled_at   TEXT NOT NULL,
    UNIQUE (student_id, subject_code)
);

CREATE TABLE IF NOT EXISTS final_exam_enrollments (
    enrollment_id TEXT PRIMARY KEY,
    student_id    TEXT NOT NULL REFERENCES students(student_id),
    final_exam_id TEXT NOT NULL REFERENCES final_exams(final_exam_id),
    enrolled_at   TEXT NOT NULL,
    UNIQUE (student_id, final_exam_id)
);

-- ── Grades ──────────────────────────────────────────────────────────────

-- One row per enrolled (student, subject); never deleted. The composite
-- foreign key rules out a grade without its enrollment, and the CHECK pins
-- status to the final score.
CREATE TABLE IF NOT EXISTS grades (
    student_id      TEXT NOT NULL,
    subject_code    TEXT NOT NULL,
    promotion_score REAL CHECK (promotion_score BETWEEN 0.0 AND 10.0),
    final_score     REAL CHECK (final_score BETWEEN 0.0 AND 10.0),
    status          TEXT NOT NULL,   -- derived: 'free' | 'regular' | 'promoted'
    last_updated    TEXT NOT NULL,
    notes           TEXT,
    PRIMARY KEY (student_id, subject_code),
    FOREIGN KEY (student_id, subject_code)
        REFERENCES subject_enrollments(student_id, subject_code),
    CHECK (
        (final_score IS NULL AND status = 'free')
        OR (final_score >= 6.0 AND status = 'promoted')
        OR (final_score < 6.0 AND status = 'regular')
    )
);

CREATE INDEX IF NOT EXISTS careers_faculty_idx      ON careers(faculty_code);
CREATE INDEX IF NOT EXISTS subjects_career_idx      ON subjects(career_code);
CREATE INDEX IF NOT EXISTS final_exams_subject_idx  ON final_exams(subject_code);
CREATE INDEX IF NOT EXISTS students_career_idx      ON students(career_code);
CREATE INDEX IF NOT EXISTS subject_enrollments_idx  ON subject_enrollments(subject_code);
CREATE INDEX IF NOT EXISTS final_exam_enrollments_idx ON final_exam_enrollments(final_exam_id);
CREATE INDEX IF NOT EXISTS grades_subject_idx       ON grades(subject_code);

PRAGMA user_version = 1;
";

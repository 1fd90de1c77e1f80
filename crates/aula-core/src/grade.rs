//! Grades and the status-derivation rule.
//!
//! A grade is keyed by `(student_id, subject_code)`. Its [`GradeStatus`] is
//! never set directly: it is a pure function of the final score and is
//! recomputed every time the final score is written. [`Grade`] exposes no
//! way to write the status, so the invariant holds by construction.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Final scores at or above this value promote the subject.
pub const PROMOTION_THRESHOLD: f64 = 6.0;

/// Lowest accepted score.
pub const MIN_SCORE: f64 = 0.0;

/// Highest accepted score.
pub const MAX_SCORE: f64 = 10.0;

// ─── Score ───────────────────────────────────────────────────────────────────

/// A numeric score in `[MIN_SCORE, MAX_SCORE]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
  pub fn new(value: f64) -> Result<Self> {
    if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::validation(format!(
        "score {value} is outside the valid range {MIN_SCORE}-{MAX_SCORE}"
      )))
    }
  }

  /// Validate an optional raw score.
  pub fn new_optional(value: Option<f64>) -> Result<Option<Self>> {
    value.map(Self::new).transpose()
  }

  pub fn value(self) -> f64 { self.0 }
}

impl TryFrom<f64> for Score {
  type Error = Error;

  fn try_from(value: f64) -> Result<Self> { Self::new(value) }
}

impl From<Score> for f64 {
  fn from(score: Score) -> Self { score.0 }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Academic standing of a student in a subject.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GradeStatus {
  /// No final score recorded.
  Free,
  /// Final score below the promotion threshold.
  Regular,
  /// Final score at or above the promotion threshold.
  Promoted,
}

impl GradeStatus {
  /// Derive the status from a final score. Total over every input.
  pub fn from_final_score(final_score: Option<Score>) -> Self {
    match final_score {
      None => Self::Free,
      Some(score) if score.value() >= PROMOTION_THRESHOLD => Self::Promoted,
      Some(_) => Self::Regular,
    }
  }
}

// ─── Grade ───────────────────────────────────────────────────────────────────

/// The grade record of one student in one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
  student_id:      String,
  subject_code:    String,
  promotion_score: Option<Score>,
  final_score:     Option<Score>,
  status:          GradeStatus,
  last_updated:    DateTime<Utc>,
  notes:           Option<String>,
}

impl Grade {
  /// A placeholder grade: no scores, status [`GradeStatus::Free`].
  pub fn placeholder(
    student_id: impl Into<String>,
    subject_code: impl Into<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self::from_parts(student_id, subject_code, None, None, None, now)
  }

  /// Rebuild a grade from stored fields. The status is derived, never read.
  pub fn from_parts(
    student_id: impl Into<String>,
    subject_code: impl Into<String>,
    promotion_score: Option<Score>,
    final_score: Option<Score>,
    notes: Option<String>,
    last_updated: DateTime<Utc>,
  ) -> Self {
    Self {
      student_id: student_id.into(),
      subject_code: subject_code.into(),
      promotion_score,
      final_score,
      status: GradeStatus::from_final_score(final_score),
      last_updated,
      notes,
    }
  }

  pub fn student_id(&self) -> &str { &self.student_id }

  pub fn subject_code(&self) -> &str { &self.subject_code }

  pub fn promotion_score(&self) -> Option<Score> { self.promotion_score }

  pub fn final_score(&self) -> Option<Score> { self.final_score }

  pub fn status(&self) -> GradeStatus { self.status }

  pub fn last_updated(&self) -> DateTime<Utc> { self.last_updated }

  pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }

  /// Write the final score and recompute the status.
  pub fn set_final_score(&mut self, score: Option<Score>, now: DateTime<Utc>) {
    self.final_score = score;
    self.status = GradeStatus::from_final_score(score);
    self.touch(now);
  }

  /// Apply a full grade-form edit.
  pub fn apply(&mut self, update: GradeUpdate, now: DateTime<Utc>) {
    self.promotion_score = update.promotion_score;
    self.notes = update.notes.filter(|n| !n.trim().is_empty());
    self.set_final_score(update.final_score, now);
  }

  /// `last_updated` strictly increases, even when two writes share a clock
  /// reading.
  fn touch(&mut self, now: DateTime<Utc>) {
    self.last_updated = if now > self.last_updated {
      now
    } else {
      self.last_updated + Duration::microseconds(1)
    };
  }
}

/// The professor's grade form: every editable field at once.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GradeUpdate {
  pub promotion_score: Option<Score>,
  pub final_score:     Option<Score>,
  pub notes:           Option<String>,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn score(v: f64) -> Score { Score::new(v).unwrap() }

  #[test]
  fn status_is_free_without_final_score() {
    assert_eq!(GradeStatus::from_final_score(None), GradeStatus::Free);
  }

  #[test]
  fn status_follows_threshold_across_range() {
    // Every hundredth between 0 and 10.
    for cents in 0..=1000 {
      let value = f64::from(cents) / 100.0;
      let status = GradeStatus::from_final_score(Some(score(value)));
      if value >= PROMOTION_THRESHOLD {
        assert_eq!(status, GradeStatus::Promoted, "score {value}");
      } else {
        assert_eq!(status, GradeStatus::Regular, "score {value}");
      }
    }
  }

  #[test]
  fn threshold_boundaries() {
    assert_eq!(
      GradeStatus::from_final_score(Some(score(6.0))),
      GradeStatus::Promoted
    );
    assert_eq!(
      GradeStatus::from_final_score(Some(score(5.99))),
      GradeStatus::Regular
    );
    assert_eq!(
      GradeStatus::from_final_score(Some(score(0.0))),
      GradeStatus::Regular
    );
  }

  #[test]
  fn score_rejects_out_of_range() {
    assert!(Score::new(-0.01).is_err());
    assert!(Score::new(10.01).is_err());
    assert!(Score::new(f64::NAN).is_err());
    assert!(Score::new(f64::INFINITY).is_err());
    assert!(Score::new(10.0).is_ok());
    assert!(matches!(Score::new(11.0), Err(Error::Validation(_))));
  }

  #[test]
  fn score_deserialization_validates() {
    let ok: Score = serde_json::from_str("7.5").unwrap();
    assert_eq!(ok.value(), 7.5);
    assert!(serde_json::from_str::<Score>("12").is_err());
  }

  #[test]
  fn setting_final_score_recomputes_status() {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut grade = Grade::placeholder("S1", "ALG", t0);
    assert_eq!(grade.status(), GradeStatus::Free);

    grade.set_final_score(Some(score(7.5)), t0 + Duration::seconds(1));
    assert_eq!(grade.status(), GradeStatus::Promoted);

    grade.set_final_score(Some(score(4.0)), t0 + Duration::seconds(2));
    assert_eq!(grade.status(), GradeStatus::Regular);

    grade.set_final_score(None, t0 + Duration::seconds(3));
    assert_eq!(grade.status(), GradeStatus::Free);
  }

  #[test]
  fn last_updated_advances_even_with_a_stuck_clock() {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut grade = Grade::placeholder("S1", "ALG", t0);
    grade.set_final_score(Some(score(8.0)), t0);
    let first = grade.last_updated();
    assert!(first > t0);
    grade.set_final_score(Some(score(3.0)), t0);
    assert!(grade.last_updated() > first);
  }

  #[test]
  fn apply_replaces_form_fields() {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut grade = Grade::placeholder("S1", "ALG", t0);
    grade.apply(
      GradeUpdate {
        promotion_score: Some(score(8.0)),
        final_score:     Some(score(5.0)),
        notes:           Some("recuperatorio".into()),
      },
      t0 + Duration::seconds(1),
    );
    assert_eq!(grade.promotion_score(), Some(score(8.0)));
    assert_eq!(grade.status(), GradeStatus::Regular);
    assert_eq!(grade.notes(), Some("recuperatorio"));

    grade.apply(GradeUpdate::default(), t0 + Duration::seconds(2));
    assert_eq!(grade.promotion_score(), None);
    assert_eq!(grade.status(), GradeStatus::Free);
    assert_eq!(grade.notes(), None);
  }
}

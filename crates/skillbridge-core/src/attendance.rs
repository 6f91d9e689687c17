//! Attendance facts — one calendar day per (subject, counterpart) pair.
//!
//! Unlike engagement and performance records these are upserted: a day may
//! be written several times as assignments come in. Every write rebuilds the
//! [`AttendanceSummary`] from the payload, so the consistency score can never
//! drift from the facts it is computed from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::{Error, Result};

const ATTENDANCE_WEIGHT: f64 = 0.6;
const COMPLETION_WEIGHT: f64 = 0.4;
const MAX_PARTICIPATION: u8 = 10;

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Punctuality {
  OnTime,
  Late,
  VeryLate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
  Pending,
  Submitted,
  Late,
  Graded,
  Missing,
}

impl AssignmentStatus {
  pub fn is_submitted(self) -> bool {
    matches!(self, Self::Submitted | Self::Late | Self::Graded)
  }
}

/// Whether (and how) the subject showed up that day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttendanceEntry {
  pub present:       bool,
  /// Only meaningful when `present`.
  pub punctuality:   Option<Punctuality>,
  pub minutes_late:  u32,
  /// 0–10.
  pub participation: u8,
}

/// One assignment that was due on, or handed in for, the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentEntry {
  pub title:          String,
  pub due_date:       NaiveDate,
  #[serde(default)]
  pub submitted_date: Option<NaiveDate>,
  pub status:         AssignmentStatus,
  #[serde(default)]
  pub score:          Option<f64>,
}

/// Everything a caller may supply for one attendance day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttendancePayload {
  pub attendance:  AttendanceEntry,
  pub assignments: Vec<AssignmentEntry>,
}

impl AttendancePayload {
  pub fn validate(&self) -> Result<()> {
    let entry = &self.attendance;
    if entry.participation > MAX_PARTICIPATION {
      return Err(Error::InvalidAttendance(format!(
        "participation {} exceeds {MAX_PARTICIPATION}",
        entry.participation
      )));
    }
    if !entry.present && entry.punctuality.is_some() {
      return Err(Error::InvalidAttendance(
        "punctuality given for an absent day".into(),
      ));
    }
    for assignment in &self.assignments {
      if let Some(score) = assignment.score
        && !(score.is_finite() && (0.0..=100.0).contains(&score))
      {
        return Err(Error::InvalidAttendance(format!(
          "assignment {:?} has score {score} outside 0..=100",
          assignment.title
        )));
      }
    }
    Ok(())
  }
}

// ─── Derived ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
  Present,
  /// Present, but late or very late.
  Partial,
  Absent,
}

/// An [`AssignmentEntry`] with its timeliness derived from the dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentOutcome {
  #[serde(flatten)]
  pub entry:     AssignmentEntry,
  pub on_time:   bool,
  pub days_late: u32,
}

impl From<AssignmentEntry> for AssignmentOutcome {
  fn from(entry: AssignmentEntry) -> Self {
    let days_late = entry
      .submitted_date
      .map(|submitted| (submitted - entry.due_date).num_days().max(0) as u32)
      .unwrap_or(0);
    let on_time = entry
      .submitted_date
      .is_some_and(|submitted| submitted <= entry.due_date);
    Self { entry, on_time, days_late }
  }
}

/// Day-level figures, recomputed from the payload on every write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
  pub total_activities:      u32,
  pub status:                AttendanceStatus,
  pub assignments_submitted: u32,
  pub assignments_total:     u32,
  /// Percentage of the day's assignments that were submitted; 0 when none.
  pub completion_rate:       f64,
  /// `round(0.6 × attendance + 0.4 × completion_rate)`.
  pub consistency_score:     u8,
}

impl AttendanceSummary {
  pub fn compute(payload: &AttendancePayload) -> Self {
    let entry = &payload.attendance;
    let assignments_total = payload.assignments.len() as u32;
    let assignments_submitted = payload
      .assignments
      .iter()
      .filter(|a| a.status.is_submitted())
      .count() as u32;

    let completion_rate = if assignments_total == 0 {
      0.0
    } else {
      f64::from(assignments_submitted) / f64::from(assignments_total) * 100.0
    };

    let status = match (entry.present, entry.punctuality) {
      (false, _) => AttendanceStatus::Absent,
      (true, Some(Punctuality::Late | Punctuality::VeryLate)) => {
        AttendanceStatus::Partial
      }
      (true, _) => AttendanceStatus::Present,
    };

    let attendance_points = if entry.present { 100.0 } else { 0.0 };
    let consistency_score = (ATTENDANCE_WEIGHT * attendance_points
      + COMPLETION_WEIGHT * completion_rate)
      .round() as u8;

    Self {
      total_activities: u32::from(entry.present) + assignments_total,
      status,
      assignments_submitted,
      assignments_total,
      completion_rate,
      consistency_score,
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The stored state of one (subject, counterpart, date) attendance day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
  pub subject_id:     Uuid,
  pub counterpart_id: Uuid,
  pub date:           NaiveDate,
  pub attendance:     AttendanceEntry,
  pub assignments:    Vec<AssignmentOutcome>,
  pub summary:        AttendanceSummary,
  /// Time of the most recent upsert.
  pub updated_at:     DateTime<Utc>,
}

impl AttendanceRecord {
  /// Validate `payload` and build the record with every derived field
  /// recomputed.
  pub fn new(
    subject_id: Uuid,
    counterpart_id: Uuid,
    date: NaiveDate,
    payload: AttendancePayload,
    updated_at: DateTime<Utc>,
  ) -> Result<Self> {
    payload.validate()?;
    let summary = AttendanceSummary::compute(&payload);
    Ok(Self {
      subject_id,
      counterpart_id,
      date,
      attendance: payload.attendance,
      assignments: payload.assignments.into_iter().map(Into::into).collect(),
      summary,
      updated_at,
    })
  }

  pub fn consistency_score(&self) -> u8 { self.summary.consistency_score }

  pub fn is_present(&self) -> bool { self.attendance.present }

  /// Recover the caller-facing payload, dropping derived fields.
  pub fn payload(&self) -> AttendancePayload {
    AttendancePayload {
      attendance:  self.attendance.clone(),
      assignments: self.assignments.iter().map(|a| a.entry.clone()).collect(),
    }
  }
}

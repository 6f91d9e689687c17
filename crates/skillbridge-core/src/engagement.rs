//! Engagement facts and the engagement scorer.
//!
//! An engagement record is one observation of activity between a subject
//! (student) and a counterpart (tutor) at an instant. Its score is a pure
//! function of the activity payload, computed once when the record is built
//! and never accepted from callers.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Rubric ──────────────────────────────────────────────────────────────────

const SESSION_ATTENDED_POINTS: f64 = 30.0;
const ASSIGNMENT_SUBMITTED_POINTS: f64 = 25.0;
const POINTS_PER_MESSAGE: f64 = 5.0;
const MESSAGE_POINTS_CAP: f64 = 15.0;
const MATERIAL_VIEWED_POINTS: f64 = 15.0;
const ASSESSMENT_TAKEN_POINTS: f64 = 15.0;
const DURATION_BONUS_POINTS: f64 = 10.0;
/// Session length at which the duration bonus saturates.
const FULL_DURATION_MINUTES: f64 = 60.0;
const MAX_SCORE: f64 = 100.0;

// ─── Payload ─────────────────────────────────────────────────────────────────

/// What happened during one engagement observation.
///
/// Every field defaults to `false` / `0` when absent. Unknown fields are
/// rejected so a caller cannot smuggle in a precomputed score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngagementActivity {
  pub session_attended:     bool,
  pub assignment_submitted: bool,
  pub material_viewed:      bool,
  pub assessment_taken:     bool,
  pub messages_sent:        u32,
  pub duration_minutes:     u32,
}

/// Compute the bounded 0–100 engagement score for an activity payload.
///
/// Each term is capped before summing; the sum is then capped at 100.
pub fn engagement_score(activity: &EngagementActivity) -> u8 {
  let mut score = 0.0;

  if activity.session_attended {
    score += SESSION_ATTENDED_POINTS;
  }
  if activity.assignment_submitted {
    score += ASSIGNMENT_SUBMITTED_POINTS;
  }
  if activity.material_viewed {
    score += MATERIAL_VIEWED_POINTS;
  }
  if activity.assessment_taken {
    score += ASSESSMENT_TAKEN_POINTS;
  }

  score += (f64::from(activity.messages_sent) * POINTS_PER_MESSAGE)
    .min(MESSAGE_POINTS_CAP);
  score += DURATION_BONUS_POINTS
    * (f64::from(activity.duration_minutes) / FULL_DURATION_MINUTES).min(1.0);

  score.min(MAX_SCORE).round() as u8
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::FactStore::record_engagement`].
///
/// `occurred_at` defaults to the time of recording when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEngagement {
  pub subject_id:     Uuid,
  pub counterpart_id: Uuid,
  #[serde(default)]
  pub occurred_at:    Option<DateTime<Utc>>,
  #[serde(default)]
  pub activity:       EngagementActivity,
}

/// An immutable engagement observation with its derived score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementRecord {
  pub record_id:        Uuid,
  pub subject_id:       Uuid,
  pub counterpart_id:   Uuid,
  pub occurred_at:      DateTime<Utc>,
  pub activity:         EngagementActivity,
  /// Derived from `activity`; see [`engagement_score`].
  pub engagement_score: u8,
}

impl EngagementRecord {
  /// Build a record, deriving the engagement score from the payload.
  pub fn new(
    record_id: Uuid,
    subject_id: Uuid,
    counterpart_id: Uuid,
    occurred_at: DateTime<Utc>,
    activity: EngagementActivity,
  ) -> Self {
    let engagement_score = engagement_score(&activity);
    Self {
      record_id,
      subject_id,
      counterpart_id,
      occurred_at,
      activity,
      engagement_score,
    }
  }

  /// Day of week of the activity instant, 0 = Sunday through 6 = Saturday.
  pub fn day_of_week(&self) -> u8 {
    self.occurred_at.weekday().num_days_from_sunday() as u8
  }

  /// Hour of day (0–23, UTC) of the activity instant.
  pub fn hour_of_day(&self) -> u8 { self.occurred_at.hour() as u8 }
}

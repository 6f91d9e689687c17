//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Instants are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical comparison in SQL matches chronological order. Dates are
//! `YYYY-MM-DD`. Payloads are compact JSON. UUIDs are hyphenated lowercase.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use skillbridge_core::{
  attendance::{AttendancePayload, AttendanceRecord},
  engagement::{EngagementActivity, EngagementRecord},
  performance::{NewPerformance, PerformanceCategory, PerformanceRecord},
  profile::{Location, SkillSnapshot},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PerformanceCategory ─────────────────────────────────────────────────────

pub fn encode_category(c: PerformanceCategory) -> &'static str {
  match c {
    PerformanceCategory::Quiz => "quiz",
    PerformanceCategory::Test => "test",
    PerformanceCategory::Assignment => "assignment",
    PerformanceCategory::Project => "project",
    PerformanceCategory::Overall => "overall",
  }
}

pub fn decode_category(s: &str) -> Result<PerformanceCategory> {
  PerformanceCategory::from_str(s).map_err(|_| Error::UnknownVariant {
    kind:  "performance category",
    value: s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `engagement_records` row.
pub struct RawEngagement {
  pub record_id:      String,
  pub subject_id:     String,
  pub counterpart_id: String,
  pub occurred_at:    String,
  pub activity_json:  String,
}

impl RawEngagement {
  pub fn into_record(self) -> Result<EngagementRecord> {
    let activity: EngagementActivity = serde_json::from_str(&self.activity_json)?;
    Ok(EngagementRecord::new(
      decode_uuid(&self.record_id)?,
      decode_uuid(&self.subject_id)?,
      decode_uuid(&self.counterpart_id)?,
      decode_dt(&self.occurred_at)?,
      activity,
    ))
  }
}

/// Raw values read directly from a `performance_records` row.
pub struct RawPerformance {
  pub record_id:      String,
  pub subject_id:     String,
  pub counterpart_id: String,
  pub category:       String,
  pub score:          f64,
  pub previous_score: Option<f64>,
  pub recorded_at:    String,
}

impl RawPerformance {
  pub fn into_record(self) -> Result<PerformanceRecord> {
    let recorded_at = decode_dt(&self.recorded_at)?;
    let input = NewPerformance {
      subject_id:     decode_uuid(&self.subject_id)?,
      counterpart_id: decode_uuid(&self.counterpart_id)?,
      category:       decode_category(&self.category)?,
      score:          self.score,
      previous_score: self.previous_score,
      recorded_at:    Some(recorded_at),
    };
    Ok(PerformanceRecord::new(
      decode_uuid(&self.record_id)?,
      recorded_at,
      input,
    )?)
  }
}

/// Raw strings read directly from an `attendance_records` row.
pub struct RawAttendance {
  pub subject_id:     String,
  pub counterpart_id: String,
  pub date:           String,
  pub payload_json:   String,
  pub updated_at:     String,
}

impl RawAttendance {
  pub fn into_record(self) -> Result<AttendanceRecord> {
    let payload: AttendancePayload = serde_json::from_str(&self.payload_json)?;
    Ok(AttendanceRecord::new(
      decode_uuid(&self.subject_id)?,
      decode_uuid(&self.counterpart_id)?,
      decode_date(&self.date)?,
      payload,
      decode_dt(&self.updated_at)?,
    )?)
  }
}

/// Raw values read directly from a `skills` row.
pub struct RawSkill {
  pub skill_id:        String,
  pub name:            String,
  pub difficulty:      u8,
  pub industry_demand: f64,
  pub total_learners:  u32,
  pub trending_score:  f64,
}

impl RawSkill {
  pub fn into_snapshot(self) -> Result<SkillSnapshot> {
    Ok(SkillSnapshot {
      skill_id:        decode_uuid(&self.skill_id)?,
      name:            self.name,
      difficulty:      self.difficulty,
      industry_demand: self.industry_demand,
      total_learners:  self.total_learners,
      trending_score:  self.trending_score,
    })
  }
}

/// Raw strings read directly from a `locations` row.
pub struct RawLocation {
  pub country: String,
  pub city:    Option<String>,
}

impl From<RawLocation> for Location {
  fn from(raw: RawLocation) -> Self {
    Location { country: raw.country, city: raw.city }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn instants_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(500);
    let c = Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(c));
    assert_eq!(encode_dt(a), "2026-03-04T09:00:00.000000Z");
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn category_names_match_serde_form() {
    for c in [
      PerformanceCategory::Quiz,
      PerformanceCategory::Test,
      PerformanceCategory::Assignment,
      PerformanceCategory::Project,
      PerformanceCategory::Overall,
    ] {
      assert_eq!(encode_category(c), AsRef::<str>::as_ref(&c));
      assert_eq!(decode_category(encode_category(c)).unwrap(), c);
    }
    assert!(matches!(
      decode_category("essay"),
      Err(Error::UnknownVariant { .. })
    ));
  }
}

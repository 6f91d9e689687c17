//! The `FactStore` and `ProfileStore` traits.
//!
//! Storage backends (e.g. `skillbridge-store-sqlite`) implement these. The
//! analytics engine depends only on the traits, never on a concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  attendance::{AttendancePayload, AttendanceRecord},
  engagement::{EngagementRecord, NewEngagement},
  performance::{CategoryFilter, NewPerformance, PerformanceRecord},
  profile::{LearningProfile, Location, SkillLevel, SkillSnapshot, TeachingProfile},
  range::DateRange,
};

// ─── Activity facts ──────────────────────────────────────────────────────────

/// Read and write access to activity facts.
///
/// Engagement and performance records are append-only. Attendance records
/// are keyed by `(subject, counterpart, date)` and written with upsert
/// semantics: the last write for a day replaces the whole record.
///
/// Derived fields (engagement score, grade, trend, attendance summary) are
/// always computed by the store from the payload; they are never accepted
/// as input.
pub trait FactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Record an engagement observation. If `occurred_at` is absent the
  /// store uses the current time.
  fn record_engagement(
    &self,
    input: NewEngagement,
  ) -> impl Future<Output = Result<EngagementRecord, Self::Error>> + Send + '_;

  /// Record a graded outcome. Fails if the score is outside 0..=100.
  fn record_performance(
    &self,
    input: NewPerformance,
  ) -> impl Future<Output = Result<PerformanceRecord, Self::Error>> + Send + '_;

  /// Insert or fully replace the attendance day for
  /// `(subject_id, counterpart_id, date)`.
  fn upsert_attendance(
    &self,
    subject_id: Uuid,
    counterpart_id: Uuid,
    date: NaiveDate,
    payload: AttendancePayload,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Engagement records for `counterpart_id` whose instant lies in `range`,
  /// ordered by instant.
  fn list_engagement(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<EngagementRecord>, Self::Error>> + Send + '_;

  /// Performance records for `counterpart_id` in `range` matching
  /// `category`, ordered by record date.
  fn list_performance(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
    category: CategoryFilter,
  ) -> impl Future<Output = Result<Vec<PerformanceRecord>, Self::Error>> + Send + '_;

  /// Attendance days for `counterpart_id` whose date falls within the
  /// calendar days of `range`, optionally restricted to one subject.
  fn list_attendance(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
    subject_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;
}

// ─── Entity snapshots ────────────────────────────────────────────────────────

/// Read access to the user and skill snapshots used for matching.
///
/// Missing data is reported as `None` or an empty list, never as an error;
/// the matching engine degrades the affected score terms to zero.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_teaching_profile(
    &self,
    user_id: Uuid,
    skill_id: Uuid,
  ) -> impl Future<Output = Result<Option<TeachingProfile>, Self::Error>> + Send + '_;

  fn get_learning_profile(
    &self,
    user_id: Uuid,
    skill_id: Uuid,
  ) -> impl Future<Output = Result<Option<LearningProfile>, Self::Error>> + Send + '_;

  fn get_location(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Location>, Self::Error>> + Send + '_;

  /// Users with a teaching profile for `skill_id`.
  fn list_tutors(
    &self,
    skill_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  fn list_skills(
    &self,
  ) -> impl Future<Output = Result<Vec<SkillSnapshot>, Self::Error>> + Send + '_;

  /// Current levels of every skill `user_id` is learning.
  fn current_skill_levels(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SkillLevel>, Self::Error>> + Send + '_;
}

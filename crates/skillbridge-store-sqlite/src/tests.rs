//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use skillbridge_core::{
  DateRange,
  attendance::{
    AssignmentEntry,
    AssignmentStatus,
    AttendanceEntry,
    AttendancePayload,
    AttendanceStatus,
  },
  engagement::{EngagementActivity, NewEngagement},
  performance::{
    CategoryFilter,
    LetterGrade,
    NewPerformance,
    PerformanceCategory,
    Trend,
  },
  profile::{
    LearningEntry,
    LearningProfile,
    Location,
    ProfileBundle,
    SkillLevel,
    SkillSnapshot,
    TeachingEntry,
    TeachingProfile,
    UserLocation,
  },
  store::{FactStore, ProfileStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn march() -> DateRange {
  DateRange::new(
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
    Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap(),
  )
  .unwrap()
}

// ─── Engagement ──────────────────────────────────────────────────────────────

fn engagement(counterpart_id: Uuid, day: u32, hour: u32) -> NewEngagement {
  NewEngagement {
    subject_id: Uuid::new_v4(),
    counterpart_id,
    occurred_at: Some(Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()),
    activity: EngagementActivity {
      session_attended: true,
      messages_sent: 4,
      duration_minutes: 90,
      ..Default::default()
    },
  }
}

#[tokio::test]
async fn engagement_score_is_derived_on_write_and_read() {
  let s = store().await;
  let tutor = Uuid::new_v4();

  let written = s.record_engagement(engagement(tutor, 4, 15)).await.unwrap();
  assert_eq!(written.engagement_score, 55);

  let listed = s.list_engagement(tutor, march()).await.unwrap();
  assert_eq!(listed, vec![written]);
}

#[tokio::test]
async fn engagement_list_is_scoped_and_ordered() {
  let s = store().await;
  let tutor = Uuid::new_v4();

  s.record_engagement(engagement(tutor, 20, 9)).await.unwrap();
  s.record_engagement(engagement(tutor, 2, 9)).await.unwrap();
  s.record_engagement(engagement(Uuid::new_v4(), 3, 9)).await.unwrap();
  let mut april = engagement(tutor, 1, 9);
  april.occurred_at = Some(Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap());
  s.record_engagement(april).await.unwrap();

  let listed = s.list_engagement(tutor, march()).await.unwrap();
  let days: Vec<u32> = listed
    .iter()
    .map(|r| chrono::Datelike::day(&r.occurred_at))
    .collect();
  assert_eq!(days, [2, 20]);
}

#[tokio::test]
async fn engagement_defaults_to_now() {
  let s = store().await;
  let tutor = Uuid::new_v4();
  let before = Utc::now() - Duration::seconds(1);

  let mut input = engagement(tutor, 1, 0);
  input.occurred_at = None;
  let record = s.record_engagement(input).await.unwrap();
  assert!(record.occurred_at >= before);

  let recent = DateRange::last_days(Utc::now() + Duration::seconds(1), 1).unwrap();
  assert_eq!(s.list_engagement(tutor, recent).await.unwrap().len(), 1);
}

// ─── Performance ─────────────────────────────────────────────────────────────

fn performance(
  counterpart_id: Uuid,
  category: PerformanceCategory,
  score: f64,
) -> NewPerformance {
  NewPerformance {
    subject_id: Uuid::new_v4(),
    counterpart_id,
    category,
    score,
    previous_score: Some(60.0),
    recorded_at: Some(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()),
  }
}

#[tokio::test]
async fn performance_round_trips_with_derived_fields() {
  let s = store().await;
  let tutor = Uuid::new_v4();

  let written = s
    .record_performance(performance(tutor, PerformanceCategory::Quiz, 91.0))
    .await
    .unwrap();
  assert_eq!(written.grade, LetterGrade::A);
  assert_eq!(written.trend, Trend::Improving);

  let listed = s
    .list_performance(tutor, march(), CategoryFilter::All)
    .await
    .unwrap();
  assert_eq!(listed, vec![written]);
}

#[tokio::test]
async fn performance_filters_by_category() {
  let s = store().await;
  let tutor = Uuid::new_v4();
  for (category, score) in [
    (PerformanceCategory::Quiz, 70.0),
    (PerformanceCategory::Test, 80.0),
    (PerformanceCategory::Quiz, 90.0),
  ] {
    s.record_performance(performance(tutor, category, score))
      .await
      .unwrap();
  }

  let quizzes = s
    .list_performance(
      tutor,
      march(),
      CategoryFilter::Only(PerformanceCategory::Quiz),
    )
    .await
    .unwrap();
  assert_eq!(quizzes.len(), 2);
  assert!(quizzes.iter().all(|r| r.category == PerformanceCategory::Quiz));

  let all = s
    .list_performance(tutor, march(), CategoryFilter::All)
    .await
    .unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn performance_rejects_out_of_range_score() {
  let s = store().await;
  let err = s
    .record_performance(performance(
      Uuid::new_v4(),
      PerformanceCategory::Test,
      101.0,
    ))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(skillbridge_core::Error::ScoreOutOfRange(_))
  ));
}

// ─── Attendance ──────────────────────────────────────────────────────────────

fn day(n: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2026, 3, n).unwrap() }

fn with_assignment(status: AssignmentStatus) -> AttendancePayload {
  AttendancePayload {
    attendance:  AttendanceEntry { present: true, ..Default::default() },
    assignments: vec![AssignmentEntry {
      title:          "worksheet".into(),
      due_date:       day(5),
      submitted_date: Some(day(5)),
      status,
      score:          None,
    }],
  }
}

#[tokio::test]
async fn attendance_upsert_replaces_the_day() {
  let s = store().await;
  let learner = Uuid::new_v4();
  let tutor = Uuid::new_v4();

  let first = s
    .upsert_attendance(
      learner,
      tutor,
      day(5),
      with_assignment(AssignmentStatus::Missing),
    )
    .await
    .unwrap();
  assert_eq!(first.summary.assignments_submitted, 0);

  let second = s
    .upsert_attendance(
      learner,
      tutor,
      day(5),
      with_assignment(AssignmentStatus::Submitted),
    )
    .await
    .unwrap();
  assert_eq!(second.summary.assignments_submitted, 1);
  assert_eq!(second.summary.consistency_score, 100);

  let listed = s.list_attendance(tutor, march(), None).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].summary, second.summary);
  assert_eq!(listed[0].payload(), second.payload());
}

#[tokio::test]
async fn attendance_filters_by_subject_and_date() {
  let s = store().await;
  let tutor = Uuid::new_v4();
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  for (subject, date) in [(alice, day(3)), (bob, day(3)), (alice, day(1))] {
    s.upsert_attendance(subject, tutor, date, AttendancePayload::default())
      .await
      .unwrap();
  }
  s.upsert_attendance(
    alice,
    tutor,
    NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
    AttendancePayload::default(),
  )
  .await
  .unwrap();

  let alices = s.list_attendance(tutor, march(), Some(alice)).await.unwrap();
  let dates: Vec<NaiveDate> = alices.iter().map(|r| r.date).collect();
  assert_eq!(dates, [day(1), day(3)]);
  assert!(alices.iter().all(|r| r.summary.status == AttendanceStatus::Absent));

  let everyone = s.list_attendance(tutor, march(), None).await.unwrap();
  assert_eq!(everyone.len(), 3);
}

#[tokio::test]
async fn attendance_rejects_invalid_payload() {
  let s = store().await;
  let mut payload = AttendancePayload::default();
  payload.attendance.participation = 11;

  let err = s
    .upsert_attendance(Uuid::new_v4(), Uuid::new_v4(), day(2), payload)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(skillbridge_core::Error::InvalidAttendance(_))
  ));
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_profiles_are_none() {
  let s = store().await;
  let user = Uuid::new_v4();
  let skill = Uuid::new_v4();

  assert!(s.get_teaching_profile(user, skill).await.unwrap().is_none());
  assert!(s.get_learning_profile(user, skill).await.unwrap().is_none());
  assert!(s.get_location(user).await.unwrap().is_none());
  assert!(s.list_tutors(skill).await.unwrap().is_empty());
  assert!(s.current_skill_levels(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn put_replaces_existing_snapshot() {
  let s = store().await;
  let user = Uuid::new_v4();
  let skill = Uuid::new_v4();

  let mut profile = TeachingProfile { level: 5, hours_taught: 10.0, rating: 4.0 };
  s.put_teaching_profile(user, skill, &profile).await.unwrap();
  profile.hours_taught = 12.5;
  s.put_teaching_profile(user, skill, &profile).await.unwrap();

  assert_eq!(
    s.get_teaching_profile(user, skill).await.unwrap(),
    Some(profile)
  );
  assert_eq!(s.list_tutors(skill).await.unwrap(), vec![user]);
}

#[tokio::test]
async fn import_bundle_writes_every_section() {
  let s = store().await;
  let tutor = Uuid::new_v4();
  let learner = Uuid::new_v4();
  let skill = SkillSnapshot {
    skill_id:        Uuid::new_v4(),
    name:            "Calligraphy".into(),
    difficulty:      3,
    industry_demand: 20.0,
    total_learners:  40,
    trending_score:  15.5,
  };
  let nairobi = Location { country: "Kenya".into(), city: Some("Nairobi".into()) };

  let bundle = ProfileBundle {
    skills:    vec![skill.clone()],
    teaching:  vec![TeachingEntry {
      user_id:  tutor,
      skill_id: skill.skill_id,
      profile:  TeachingProfile { level: 9, hours_taught: 300.0, rating: 4.9 },
    }],
    learning:  vec![LearningEntry {
      user_id:  learner,
      skill_id: skill.skill_id,
      profile:  LearningProfile {
        current_level:  2,
        target_level:   6,
        total_sessions: 14,
      },
    }],
    locations: vec![UserLocation { user_id: learner, location: nairobi.clone() }],
  };
  assert_eq!(s.import_profiles(bundle).await.unwrap(), 4);

  assert_eq!(s.list_skills().await.unwrap(), vec![skill.clone()]);
  assert_eq!(s.list_tutors(skill.skill_id).await.unwrap(), vec![tutor]);
  assert_eq!(s.get_location(learner).await.unwrap(), Some(nairobi));
  assert_eq!(s.current_skill_levels(learner).await.unwrap(), vec![SkillLevel {
    skill_id: skill.skill_id,
    level:    2,
  }]);
}

//! [`Analytics`] — reads facts and snapshots from a store and runs the pure
//! aggregators and scorers over them.
//!
//! Every operation validates its arguments before the first store call, so
//! a bad request never touches the backend and never yields a partial
//! result.

use serde::Serialize;
use skillbridge_core::{
  DateRange,
  performance::CategoryFilter,
  store::{FactStore, ProfileStore},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error,
  Result,
  consistency::{self, ConsistencyReport},
  distribution::{self, ScoreDistribution},
  heatmap::{self, ActivityHeatmap},
  matching::{self, MatchCandidate, MatchScore, SkillRecommendation, TutorMatch},
};

/// Both directions of a tutor/learner pairing for one skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairFit {
  pub candidate:   MatchCandidate,
  pub tutor_fit:   MatchScore,
  pub learner_fit: MatchScore,
}

/// The analytics engine over a store `S`.
///
/// Cloning is as cheap as cloning the store.
#[derive(Clone)]
pub struct Analytics<S> {
  store: S,
}

impl<S> Analytics<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }
}

// ─── Activity facts ──────────────────────────────────────────────────────────

impl<S: FactStore> Analytics<S> {
  /// The 7×24 activity heatmap for `counterpart_id` over `range`.
  pub async fn activity_heatmap(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
  ) -> Result<ActivityHeatmap> {
    let records = self
      .store
      .list_engagement(counterpart_id, range)
      .await
      .map_err(Error::store)?;
    debug!(%counterpart_id, records = records.len(), "building activity heatmap");
    Ok(heatmap::build_heatmap(counterpart_id, range, &records))
  }

  /// Score histogram, statistics, outliers and insights.
  ///
  /// `bin_width` defaults to 10 and must evenly divide 100.
  pub async fn score_distribution(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
    category: CategoryFilter,
    bin_width: Option<u32>,
  ) -> Result<ScoreDistribution> {
    let bin_width = bin_width.unwrap_or(distribution::DEFAULT_BIN_WIDTH);
    distribution::validate_bin_width(bin_width)?;

    let records = self
      .store
      .list_performance(counterpart_id, range, category)
      .await
      .map_err(Error::store)?;
    debug!(
      %counterpart_id,
      %category,
      bin_width,
      records = records.len(),
      "analyzing score distribution"
    );
    distribution::analyze_distribution(
      counterpart_id,
      range,
      category,
      bin_width,
      &records,
    )
  }

  /// Consistency days, streaks and weekly rollups, optionally for a single
  /// subject.
  pub async fn consistency_report(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
    subject_id: Option<Uuid>,
  ) -> Result<ConsistencyReport> {
    let records = self
      .store
      .list_attendance(counterpart_id, range, subject_id)
      .await
      .map_err(Error::store)?;
    debug!(%counterpart_id, records = records.len(), "tracking consistency");
    Ok(consistency::track_consistency(
      counterpart_id,
      range,
      subject_id,
      &records,
    ))
  }
}

// ─── Matching ────────────────────────────────────────────────────────────────

impl<S: ProfileStore> Analytics<S> {
  /// Gather the snapshots for one tutor/learner pairing.
  pub async fn candidate(
    &self,
    skill_id: Uuid,
    tutor_id: Uuid,
    learner_id: Uuid,
  ) -> Result<MatchCandidate> {
    let teaching = self
      .store
      .get_teaching_profile(tutor_id, skill_id)
      .await
      .map_err(Error::store)?;
    let learning = self
      .store
      .get_learning_profile(learner_id, skill_id)
      .await
      .map_err(Error::store)?;
    let tutor_location =
      self.store.get_location(tutor_id).await.map_err(Error::store)?;
    let learner_location =
      self.store.get_location(learner_id).await.map_err(Error::store)?;

    Ok(MatchCandidate {
      skill_id,
      tutor_id,
      learner_id,
      teaching,
      learning,
      tutor_location,
      learner_location,
    })
  }

  /// How well `tutor_id` suits `learner_id` for `skill_id`.
  pub async fn tutor_fit(
    &self,
    skill_id: Uuid,
    tutor_id: Uuid,
    learner_id: Uuid,
  ) -> Result<MatchScore> {
    let candidate = self.candidate(skill_id, tutor_id, learner_id).await?;
    let fit = candidate.tutor_fit();
    debug!(%skill_id, %tutor_id, %learner_id, score = fit.score, "tutor fit");
    Ok(fit)
  }

  /// How well `learner_id` suits `tutor_id` for `skill_id`.
  pub async fn learner_fit(
    &self,
    skill_id: Uuid,
    tutor_id: Uuid,
    learner_id: Uuid,
  ) -> Result<MatchScore> {
    let candidate = self.candidate(skill_id, tutor_id, learner_id).await?;
    let fit = candidate.learner_fit();
    debug!(%skill_id, %tutor_id, %learner_id, score = fit.score, "learner fit");
    Ok(fit)
  }

  /// Both fit scores for a pairing, with the snapshots they were built from.
  pub async fn pair_fit(
    &self,
    skill_id: Uuid,
    tutor_id: Uuid,
    learner_id: Uuid,
  ) -> Result<PairFit> {
    let candidate = self.candidate(skill_id, tutor_id, learner_id).await?;
    Ok(PairFit {
      tutor_fit: candidate.tutor_fit(),
      learner_fit: candidate.learner_fit(),
      candidate,
    })
  }

  /// Every tutor of `skill_id` ranked for `learner_id`, best first.
  ///
  /// The learner never appears in their own ranking.
  pub async fn rank_tutors(
    &self,
    skill_id: Uuid,
    learner_id: Uuid,
    limit: Option<usize>,
  ) -> Result<Vec<TutorMatch>> {
    let tutors = self.store.list_tutors(skill_id).await.map_err(Error::store)?;
    let learning = self
      .store
      .get_learning_profile(learner_id, skill_id)
      .await
      .map_err(Error::store)?;
    let learner_location =
      self.store.get_location(learner_id).await.map_err(Error::store)?;

    let mut candidates = Vec::with_capacity(tutors.len());
    for tutor_id in tutors.into_iter().filter(|t| *t != learner_id) {
      let teaching = self
        .store
        .get_teaching_profile(tutor_id, skill_id)
        .await
        .map_err(Error::store)?;
      let tutor_location =
        self.store.get_location(tutor_id).await.map_err(Error::store)?;
      candidates.push(MatchCandidate {
        skill_id,
        tutor_id,
        learner_id,
        teaching,
        learning: learning.clone(),
        tutor_location,
        learner_location: learner_location.clone(),
      });
    }

    let mut ranked = matching::rank_tutors(&candidates);
    if let Some(limit) = limit {
      ranked.truncate(limit);
    }
    debug!(%skill_id, %learner_id, tutors = ranked.len(), "ranked tutors");
    Ok(ranked)
  }

  /// Skills `user_id` is not yet learning, best recommendation first.
  pub async fn recommend_skills(
    &self,
    user_id: Uuid,
    exclude: &[Uuid],
    limit: Option<usize>,
  ) -> Result<Vec<SkillRecommendation>> {
    let levels = self
      .store
      .current_skill_levels(user_id)
      .await
      .map_err(Error::store)?;
    let skills = self.store.list_skills().await.map_err(Error::store)?;

    let mut recommendations =
      matching::recommend_skills(&levels, &skills, exclude);
    if let Some(limit) = limit {
      recommendations.truncate(limit);
    }
    debug!(
      %user_id,
      known = levels.len(),
      recommended = recommendations.len(),
      "recommended skills"
    );
    Ok(recommendations)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, NaiveDate, TimeZone, Utc};
  use pretty_assertions::assert_eq;
  use skillbridge_core::{
    attendance::{AttendanceEntry, AttendancePayload},
    engagement::{EngagementActivity, NewEngagement},
    performance::{NewPerformance, PerformanceCategory},
    profile::{LearningProfile, Location, SkillSnapshot, TeachingProfile},
  };
  use skillbridge_store_sqlite::SqliteStore;

  use super::*;
  use crate::matching::Factor;

  async fn engine() -> Analytics<SqliteStore> {
    Analytics::new(SqliteStore::open_in_memory().await.unwrap())
  }

  fn range() -> DateRange {
    DateRange::new(
      Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
      Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap(),
    )
    .unwrap()
  }

  #[tokio::test]
  async fn heatmap_reads_from_store() {
    let engine = engine().await;
    let tutor = Uuid::new_v4();
    // 2026-03-04 is a Wednesday.
    let at = Utc.with_ymd_and_hms(2026, 3, 4, 15, 30, 0).unwrap();
    for _ in 0..2 {
      engine
        .store()
        .record_engagement(NewEngagement {
          subject_id:     Uuid::new_v4(),
          counterpart_id: tutor,
          occurred_at:    Some(at),
          activity:       EngagementActivity {
            session_attended: true,
            messages_sent: 4,
            duration_minutes: 90,
            ..Default::default()
          },
        })
        .await
        .unwrap();
    }

    let heatmap = engine.activity_heatmap(tutor, range()).await.unwrap();
    assert_eq!(heatmap.cells.len(), 168);
    assert_eq!(heatmap.summary.total_activities, 2);
    let peak = heatmap.summary.peak.unwrap();
    assert_eq!((peak.day_of_week, peak.hour_of_day), (3, 15));
    assert_eq!(heatmap.summary.average_engagement, 55.0);
  }

  #[tokio::test]
  async fn distribution_matches_reference_population() {
    let engine = engine().await;
    let tutor = Uuid::new_v4();
    let at = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
    for score in [50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 55.0, 65.0, 75.0, 85.0] {
      engine
        .store()
        .record_performance(NewPerformance {
          subject_id:     Uuid::new_v4(),
          counterpart_id: tutor,
          category:       PerformanceCategory::Overall,
          score,
          previous_score: None,
          recorded_at:    Some(at),
        })
        .await
        .unwrap();
    }

    let filter = CategoryFilter::Only(PerformanceCategory::Overall);
    let dist = engine
      .score_distribution(tutor, range(), filter, None)
      .await
      .unwrap();
    assert_eq!(dist.statistics.count, 10);
    assert_eq!(dist.statistics.mean, 72.5);
    assert_eq!(dist.statistics.median, 72.5);
    let bin = dist.bins.iter().find(|b| b.label == "70-79").unwrap();
    assert_eq!(bin.count, 2);
    assert_eq!(bin.percentage, 20.0);
  }

  #[tokio::test]
  async fn bad_bin_width_fails_before_reading() {
    let engine = engine().await;
    let err = engine
      .score_distribution(Uuid::new_v4(), range(), CategoryFilter::All, Some(7))
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      Error::Core(skillbridge_core::Error::UnsupportedBinWidth(7))
    ));
  }

  #[tokio::test]
  async fn consistency_uses_latest_attendance_write() {
    let engine = engine().await;
    let learner = Uuid::new_v4();
    let tutor = Uuid::new_v4();
    let first = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let present = AttendancePayload {
      attendance: AttendanceEntry { present: true, ..Default::default() },
      ..Default::default()
    };

    for i in 0..3 {
      engine
        .store()
        .upsert_attendance(learner, tutor, first + Duration::days(i), present.clone())
        .await
        .unwrap();
    }
    // Rewrite the last day as absent.
    engine
      .store()
      .upsert_attendance(
        learner,
        tutor,
        first + Duration::days(2),
        AttendancePayload::default(),
      )
      .await
      .unwrap();

    let report = engine
      .consistency_report(tutor, range(), Some(learner))
      .await
      .unwrap();
    assert_eq!(report.days.len(), 3);
    assert_eq!(report.statistics.present_days, 2);
    assert_eq!(report.statistics.current_streak, 0);
  }

  #[tokio::test]
  async fn matching_degrades_missing_profiles() {
    let engine = engine().await;
    let store = engine.store();
    let skill = Uuid::new_v4();
    let learner = Uuid::new_v4();
    let strong = Uuid::new_v4();
    let weak = Uuid::new_v4();

    store
      .put_teaching_profile(strong, skill, &TeachingProfile {
        level:        8,
        hours_taught: 120.0,
        rating:       4.5,
      })
      .await
      .unwrap();
    store
      .put_teaching_profile(weak, skill, &TeachingProfile {
        level:        2,
        hours_taught: 5.0,
        rating:       3.0,
      })
      .await
      .unwrap();
    store
      .put_learning_profile(learner, skill, &LearningProfile {
        current_level:  3,
        target_level:   8,
        total_sessions: 20,
      })
      .await
      .unwrap();
    store
      .put_location(strong, &Location { country: "Chile".into(), city: None })
      .await
      .unwrap();
    store
      .put_location(learner, &Location { country: "Chile".into(), city: None })
      .await
      .unwrap();

    let ranked = engine.rank_tutors(skill, learner, None).await.unwrap();
    let ids: Vec<Uuid> = ranked.iter().map(|m| m.tutor_id).collect();
    assert_eq!(ids, vec![strong, weak]);
    // 30 + 36 + 20 + 10
    assert_eq!(ranked[0].fit.score, 96);

    let stranger = Uuid::new_v4();
    let fit = engine.tutor_fit(skill, stranger, learner).await.unwrap();
    assert_eq!(fit.score, 0);

    let pair = engine.pair_fit(skill, strong, learner).await.unwrap();
    // 20 + 12 + 20 + 10
    assert_eq!(pair.learner_fit.score, 62);
    assert_eq!(pair.tutor_fit, ranked[0].fit);
  }

  #[tokio::test]
  async fn learner_fit_reads_both_snapshots() {
    let engine = engine().await;
    let store = engine.store();
    let skill = Uuid::new_v4();
    let tutor = Uuid::new_v4();
    let learner = Uuid::new_v4();

    store
      .put_teaching_profile(tutor, skill, &TeachingProfile {
        level:        4,
        hours_taught: 40.0,
        rating:       4.0,
      })
      .await
      .unwrap();
    store
      .put_learning_profile(learner, skill, &LearningProfile {
        current_level:  1,
        target_level:   6,
        total_sessions: 10,
      })
      .await
      .unwrap();
    let lagos = Location { country: "Nigeria".into(), city: Some("Lagos".into()) };
    store.put_location(tutor, &lagos).await.unwrap();
    store.put_location(learner, &lagos).await.unwrap();

    let fit = engine.learner_fit(skill, tutor, learner).await.unwrap();
    let b = &fit.breakdown;
    assert_eq!(b.points(Factor::Motivation), 20.0);
    assert_eq!(b.points(Factor::Sessions), 6.0);
    // tutor level 4 is below the learner's target of 6
    assert_eq!(b.points(Factor::TutorLevel), 0.0);
    assert_eq!(b.points(Factor::Location), 10.0);
    assert_eq!(fit.score, 36);

    let stranger = Uuid::new_v4();
    let none = engine.learner_fit(skill, stranger, learner).await.unwrap();
    assert_eq!(none.score, 0);
    assert!(none.breakdown.terms.is_empty());
  }

  #[tokio::test]
  async fn recommendations_exclude_known_skills() {
    let engine = engine().await;
    let store = engine.store();
    let user = Uuid::new_v4();
    let known = SkillSnapshot {
      skill_id:        Uuid::new_v4(),
      name:            "Guitar".into(),
      difficulty:      4,
      industry_demand: 90.0,
      total_learners:  900,
      trending_score:  90.0,
    };
    let fresh = SkillSnapshot {
      skill_id: Uuid::new_v4(),
      name: "Pottery".into(),
      ..known.clone()
    };
    store.put_skill(&known).await.unwrap();
    store.put_skill(&fresh).await.unwrap();
    store
      .put_learning_profile(user, known.skill_id, &LearningProfile {
        current_level:  4,
        target_level:   7,
        total_sessions: 3,
      })
      .await
      .unwrap();

    let recs = engine.recommend_skills(user, &[], Some(5)).await.unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].name, "Pottery");
    // 36 + 27 + 18 + 10
    assert_eq!(recs[0].score.score, 91);
  }
}

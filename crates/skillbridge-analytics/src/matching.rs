//! Weighted tutor/learner fit and skill recommendation scores.
//!
//! Every score is the sum of a few weighted terms, each built from a
//! sub-factor clamped to `[0, 1]`, and the final value is
//! `min(100, round(sum))`. Missing inputs never fail: the affected term
//! contributes 0 and the score is still returned.

use std::cmp::Ordering;

use serde::Serialize;
use skillbridge_core::profile::{
  LearningProfile,
  Location,
  SkillLevel,
  SkillSnapshot,
  TeachingProfile,
};
use strum::Display;
use uuid::Uuid;

use crate::round2;

// Tutor fit.
const WEIGHT_HOURS: f64 = 30.0;
const WEIGHT_RATING: f64 = 40.0;
const WEIGHT_LEVEL_MATCH: f64 = 20.0;
const BONUS_SAME_COUNTRY: f64 = 10.0;
const BONUS_SAME_CITY: f64 = 5.0;
const HOURS_SATURATION: f64 = 100.0;
const MAX_RATING: f64 = 5.0;
const LEVEL_SPAN: f64 = 10.0;

// Learner fit.
const WEIGHT_MOTIVATION: f64 = 40.0;
const WEIGHT_SESSIONS: f64 = 30.0;
const BONUS_TUTOR_LEVEL: f64 = 20.0;
const SESSIONS_SATURATION: f64 = 50.0;

// Skill recommendation.
const WEIGHT_DEMAND: f64 = 40.0;
const WEIGHT_LEARNERS: f64 = 30.0;
const WEIGHT_TRENDING: f64 = 20.0;
const BONUS_DIFFICULTY: f64 = 10.0;
const LEARNERS_SATURATION: f64 = 1000.0;
const DIFFICULTY_TOLERANCE: f64 = 2.0;

pub const MAX_SCORE: u8 = 100;

// ─── Score records ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Factor {
  TeachingHours,
  Rating,
  LevelMatch,
  Location,
  Motivation,
  Sessions,
  TutorLevel,
  IndustryDemand,
  Learners,
  Trending,
  Difficulty,
}

/// One weighted contribution to a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreTerm {
  pub factor: Factor,
  /// Sub-factor after clamping to `[0, 1]`.
  pub value:  f64,
  /// Points contributed, rounded to two decimals for display.
  pub points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
  pub terms: Vec<ScoreTerm>,
  /// Unrounded, uncapped sum of the terms.
  pub raw:   f64,
}

impl ScoreBreakdown {
  pub fn points(&self, factor: Factor) -> f64 {
    self
      .terms
      .iter()
      .find(|t| t.factor == factor)
      .map_or(0.0, |t| t.points)
  }
}

/// A 0–100 score with the terms that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchScore {
  pub score:     u8,
  pub breakdown: ScoreBreakdown,
}

impl MatchScore {
  fn zero() -> Self { Self::default() }
}

#[derive(Default)]
struct Terms {
  terms: Vec<ScoreTerm>,
  raw:   f64,
}

impl Terms {
  /// Add `weight * clamp(value, 0, 1)`.
  fn weighted(self, factor: Factor, weight: f64, value: f64) -> Self {
    let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    self.push(factor, value, weight * value)
  }

  /// Add a fixed bonus, possibly above the nominal weight.
  fn bonus(self, factor: Factor, earned: bool, points: f64) -> Self {
    let value = if earned { 1.0 } else { 0.0 };
    self.push(factor, value, if earned { points } else { 0.0 })
  }

  fn push(mut self, factor: Factor, value: f64, points: f64) -> Self {
    self.raw += points;
    self.terms.push(ScoreTerm { factor, value, points: round2(points) });
    self
  }

  fn finish(self) -> MatchScore {
    let score = self.raw.round().clamp(0.0, f64::from(MAX_SCORE)) as u8;
    MatchScore {
      score,
      breakdown: ScoreBreakdown { terms: self.terms, raw: round2(self.raw) },
    }
  }
}

fn same_country(a: Option<&Location>, b: Option<&Location>) -> bool {
  matches!((a, b), (Some(a), Some(b)) if a.same_country(b))
}

fn same_city(a: Option<&Location>, b: Option<&Location>) -> bool {
  matches!((a, b), (Some(a), Some(b)) if a.same_country(b) && a.same_city(b))
}

// ─── Pair scoring ────────────────────────────────────────────────────────────

/// A tutor and a learner considered for one skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
  pub skill_id:         Uuid,
  pub tutor_id:         Uuid,
  pub learner_id:       Uuid,
  /// `None` when the tutor does not teach the skill.
  pub teaching:         Option<TeachingProfile>,
  /// `None` when the learner is not learning the skill.
  pub learning:         Option<LearningProfile>,
  pub tutor_location:   Option<Location>,
  pub learner_location: Option<Location>,
}

impl MatchCandidate {
  /// How well the tutor suits the learner.
  ///
  /// A tutor who does not teach the skill scores 0.
  pub fn tutor_fit(&self) -> MatchScore {
    let Some(teaching) = &self.teaching else {
      return MatchScore::zero();
    };

    let level_match = self.learning.as_ref().map_or(0.0, |learning| {
      let gap =
        (f64::from(teaching.level) - f64::from(learning.target_level)).abs();
      (LEVEL_SPAN - gap).max(0.0) / LEVEL_SPAN
    });

    let tutor_loc = self.tutor_location.as_ref();
    let learner_loc = self.learner_location.as_ref();
    let mut location_points = 0.0;
    if same_country(tutor_loc, learner_loc) {
      location_points += BONUS_SAME_COUNTRY;
      if same_city(tutor_loc, learner_loc) {
        location_points += BONUS_SAME_CITY;
      }
    }

    Terms::default()
      .weighted(
        Factor::TeachingHours,
        WEIGHT_HOURS,
        teaching.hours_taught / HOURS_SATURATION,
      )
      .weighted(Factor::Rating, WEIGHT_RATING, teaching.rating / MAX_RATING)
      .weighted(Factor::LevelMatch, WEIGHT_LEVEL_MATCH, level_match)
      .push(
        Factor::Location,
        if location_points > 0.0 { 1.0 } else { 0.0 },
        location_points,
      )
      .finish()
  }

  /// How well the learner suits the tutor.
  ///
  /// Also 0 when the tutor does not teach the skill.
  pub fn learner_fit(&self) -> MatchScore {
    let Some(teaching) = &self.teaching else {
      return MatchScore::zero();
    };
    let learning = self.learning.as_ref();

    let motivation = learning.map_or(0.0, |l| {
      (f64::from(l.target_level) - f64::from(l.current_level)) / LEVEL_SPAN
    });
    let sessions = learning
      .map_or(0.0, |l| f64::from(l.total_sessions) / SESSIONS_SATURATION);
    let tutor_level_ok = learning.is_some_and(|l| teaching.level >= l.target_level);

    Terms::default()
      .weighted(Factor::Motivation, WEIGHT_MOTIVATION, motivation)
      .weighted(Factor::Sessions, WEIGHT_SESSIONS, sessions)
      .bonus(Factor::TutorLevel, tutor_level_ok, BONUS_TUTOR_LEVEL)
      .bonus(
        Factor::Location,
        same_country(
          self.tutor_location.as_ref(),
          self.learner_location.as_ref(),
        ),
        BONUS_SAME_COUNTRY,
      )
      .finish()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorMatch {
  pub tutor_id: Uuid,
  /// 0 when the tutor has no teaching profile for the skill.
  pub rating:   f64,
  pub fit:      MatchScore,
}

/// Score and order tutors for a learner.
///
/// Sorted by tutor fit descending, then rating descending, then tutor id
/// ascending, so the order is fully deterministic.
pub fn rank_tutors(candidates: &[MatchCandidate]) -> Vec<TutorMatch> {
  let mut ranked: Vec<TutorMatch> = candidates
    .iter()
    .map(|c| TutorMatch {
      tutor_id: c.tutor_id,
      rating:   c.teaching.as_ref().map_or(0.0, |t| t.rating),
      fit:      c.tutor_fit(),
    })
    .collect();
  ranked.sort_by(|a, b| {
    b.fit
      .score
      .cmp(&a.fit.score)
      .then_with(|| b.rating.total_cmp(&a.rating))
      .then_with(|| a.tutor_id.cmp(&b.tutor_id))
  });
  ranked
}

// ─── Skill recommendations ───────────────────────────────────────────────────

/// Recommendation score for one skill given the user's current levels.
///
/// The difficulty bonus needs at least one current level to average; with
/// none it contributes 0.
pub fn skill_score(skill: &SkillSnapshot, user_levels: &[SkillLevel]) -> MatchScore {
  let difficulty_fits = average_level(user_levels).is_some_and(|avg| {
    (f64::from(skill.difficulty) - avg).abs() <= DIFFICULTY_TOLERANCE
  });

  Terms::default()
    .weighted(
      Factor::IndustryDemand,
      WEIGHT_DEMAND,
      skill.industry_demand / 100.0,
    )
    .weighted(
      Factor::Learners,
      WEIGHT_LEARNERS,
      f64::from(skill.total_learners) / LEARNERS_SATURATION,
    )
    .weighted(Factor::Trending, WEIGHT_TRENDING, skill.trending_score / 100.0)
    .bonus(Factor::Difficulty, difficulty_fits, BONUS_DIFFICULTY)
    .finish()
}

fn average_level(levels: &[SkillLevel]) -> Option<f64> {
  if levels.is_empty() {
    return None;
  }
  let sum: u32 = levels.iter().map(|l| u32::from(l.level)).sum();
  Some(f64::from(sum) / levels.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRecommendation {
  pub skill_id: Uuid,
  pub name:     String,
  pub score:    MatchScore,
}

/// Rank `skills` for a user, skipping the ones they already learn and any
/// id in `exclude`.
///
/// Sorted by score descending, ties by name ascending.
pub fn recommend_skills(
  user_levels: &[SkillLevel],
  skills: &[SkillSnapshot],
  exclude: &[Uuid],
) -> Vec<SkillRecommendation> {
  let mut recommendations: Vec<SkillRecommendation> = skills
    .iter()
    .filter(|s| {
      !exclude.contains(&s.skill_id)
        && !user_levels.iter().any(|l| l.skill_id == s.skill_id)
    })
    .map(|s| SkillRecommendation {
      skill_id: s.skill_id,
      name:     s.name.clone(),
      score:    skill_score(s, user_levels),
    })
    .collect();
  recommendations.sort_by(|a, b| match b.score.score.cmp(&a.score.score) {
    Ordering::Equal => a.name.cmp(&b.name),
    other => other,
  });
  recommendations
}

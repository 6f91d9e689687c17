//! Entity snapshots consumed by the matching engine.
//!
//! These are read-only views of user and skill entities owned elsewhere.
//! Levels are on a 1–10 scale.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a user teaches one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachingProfile {
  pub level:        u8,
  pub hours_taught: f64,
  /// Average learner rating, 0–5.
  pub rating:       f64,
}

/// How a user is learning one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProfile {
  pub current_level:  u8,
  pub target_level:   u8,
  /// Completed learning sessions across all skills.
  pub total_sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub country: String,
  pub city:    Option<String>,
}

impl Location {
  pub fn same_country(&self, other: &Location) -> bool {
    !self.country.is_empty() && self.country.eq_ignore_ascii_case(&other.country)
  }

  pub fn same_city(&self, other: &Location) -> bool {
    match (&self.city, &other.city) {
      (Some(a), Some(b)) => !a.is_empty() && a.eq_ignore_ascii_case(b),
      _ => false,
    }
  }
}

/// Catalogue-level figures for a skill, used for recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
  pub skill_id:        Uuid,
  pub name:            String,
  /// 1–10.
  pub difficulty:      u8,
  /// 0–100.
  pub industry_demand: f64,
  pub total_learners:  u32,
  /// 0–100.
  pub trending_score:  f64,
}

/// A user's current level in one skill they are learning or teaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevel {
  pub skill_id: Uuid,
  pub level:    u8,
}

// ─── Import bundle ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachingEntry {
  pub user_id:  Uuid,
  pub skill_id: Uuid,
  #[serde(flatten)]
  pub profile:  TeachingProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEntry {
  pub user_id:  Uuid,
  pub skill_id: Uuid,
  #[serde(flatten)]
  pub profile:  LearningProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
  pub user_id:  Uuid,
  #[serde(flatten)]
  pub location: Location,
}

/// A batch of snapshots exported from the system that owns users and skills.
///
/// Every section is optional in the JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileBundle {
  pub skills:    Vec<SkillSnapshot>,
  pub teaching:  Vec<TeachingEntry>,
  pub learning:  Vec<LearningEntry>,
  pub locations: Vec<UserLocation>,
}

impl ProfileBundle {
  pub fn len(&self) -> usize {
    self.skills.len()
      + self.teaching.len()
      + self.learning.len()
      + self.locations.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

//! Performance facts — one graded outcome per record.
//!
//! Letter grade and trend are derived from the score (and the optional
//! previous score) when the record is built.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Relative change (in percent) beyond which a score counts as a trend.
const TREND_THRESHOLD_PCT: f64 = 5.0;

// ─── Category ────────────────────────────────────────────────────────────────

/// The kind of graded event a record describes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PerformanceCategory {
  Quiz,
  Test,
  Assignment,
  Project,
  Overall,
}

impl PerformanceCategory {
  /// Parse a category name, mapping failures to [`Error::UnknownCategory`].
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownCategory(s.to_owned()))
  }
}

/// Category scope of a distribution query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
  #[default]
  All,
  Only(PerformanceCategory),
}

impl CategoryFilter {
  pub fn matches(&self, category: PerformanceCategory) -> bool {
    match self {
      Self::All => true,
      Self::Only(c) => *c == category,
    }
  }
}

impl fmt::Display for CategoryFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::All => f.write_str("all"),
      Self::Only(c) => write!(f, "{c}"),
    }
  }
}

impl FromStr for CategoryFilter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    if s == "all" {
      Ok(Self::All)
    } else {
      PerformanceCategory::parse(s).map(Self::Only)
    }
  }
}

// ─── Grade & trend ───────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
)]
pub enum LetterGrade {
  A,
  B,
  C,
  D,
  F,
}

impl LetterGrade {
  pub fn from_score(score: f64) -> Self {
    match score {
      s if s >= 90.0 => Self::A,
      s if s >= 80.0 => Self::B,
      s if s >= 70.0 => Self::C,
      s if s >= 60.0 => Self::D,
      _ => Self::F,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
  Improving,
  Stable,
  Declining,
}

impl Trend {
  /// Compare `score` against `previous` using a ±5 % relative threshold.
  pub fn between(previous: Option<f64>, score: f64) -> Self {
    let Some(previous) = previous else {
      return Self::Stable;
    };
    if previous == 0.0 {
      return if score > 0.0 { Self::Improving } else { Self::Stable };
    }

    let change_pct = (score - previous) / previous * 100.0;
    if change_pct > TREND_THRESHOLD_PCT {
      Self::Improving
    } else if change_pct < -TREND_THRESHOLD_PCT {
      Self::Declining
    } else {
      Self::Stable
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::FactStore::record_performance`].
///
/// Grade and trend are not accepted here; they are always derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPerformance {
  pub subject_id:     Uuid,
  pub counterpart_id: Uuid,
  pub category:       PerformanceCategory,
  pub score:          f64,
  #[serde(default)]
  pub previous_score: Option<f64>,
  /// Date of the graded event; defaults to the time of recording.
  #[serde(default)]
  pub recorded_at:    Option<DateTime<Utc>>,
}

impl NewPerformance {
  pub fn validate(&self) -> Result<()> {
    check_score(self.score)?;
    if let Some(previous) = self.previous_score {
      check_score(previous)?;
    }
    Ok(())
  }
}

fn check_score(score: f64) -> Result<()> {
  if score.is_finite() && (0.0..=100.0).contains(&score) {
    Ok(())
  } else {
    Err(Error::ScoreOutOfRange(score))
  }
}

/// An immutable graded outcome with its derived grade and trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
  pub record_id:      Uuid,
  pub subject_id:     Uuid,
  pub counterpart_id: Uuid,
  pub recorded_at:    DateTime<Utc>,
  pub category:       PerformanceCategory,
  pub score:          f64,
  pub previous_score: Option<f64>,
  pub grade:          LetterGrade,
  pub trend:          Trend,
}

impl PerformanceRecord {
  /// Build a record from a validated payload, deriving grade and trend.
  pub fn new(
    record_id: Uuid,
    recorded_at: DateTime<Utc>,
    input: NewPerformance,
  ) -> Result<Self> {
    input.validate()?;
    Ok(Self {
      record_id,
      subject_id: input.subject_id,
      counterpart_id: input.counterpart_id,
      recorded_at,
      category: input.category,
      score: input.score,
      previous_score: input.previous_score,
      grade: LetterGrade::from_score(input.score),
      trend: Trend::between(input.previous_score, input.score),
    })
  }
}

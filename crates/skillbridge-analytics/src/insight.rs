//! A small rule engine that turns computed figures into insight records.
//!
//! Each aggregator declares its rules as data: a predicate over its own
//! statistics and a constructor for the insight to emit when the predicate
//! holds. [`evaluate`] runs the rules in declaration order and returns the
//! fired insights sorted by priority, highest first; insights of equal
//! priority keep their declaration order.

use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightCategory {
  Engagement,
  Performance,
  Attendance,
  Submission,
  Consistency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightLevel {
  Success,
  Info,
  Warning,
}

/// Ordering is `High < Medium < Low`, so an ascending sort puts the most
/// important insights first.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
  High,
  Medium,
  Low,
}

/// A human-readable observation about a computed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
  pub category: InsightCategory,
  pub level:    InsightLevel,
  pub priority: Priority,
  pub title:    String,
  pub message:  String,
}

impl Insight {
  pub fn new(
    category: InsightCategory,
    level: InsightLevel,
    priority: Priority,
    title: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    Self {
      category,
      level,
      priority,
      title: title.into(),
      message: message.into(),
    }
  }
}

/// One rule: emit `emit(stats)` whenever `when(stats)` holds.
pub struct Rule<S> {
  pub when: fn(&S) -> bool,
  pub emit: fn(&S) -> Insight,
}

/// Run `rules` against `stats` and return the fired insights by priority.
pub fn evaluate<S>(rules: &[Rule<S>], stats: &S) -> Vec<Insight> {
  let mut insights: Vec<Insight> = rules
    .iter()
    .filter(|rule| (rule.when)(stats))
    .map(|rule| (rule.emit)(stats))
    .collect();
  insights.sort_by_key(|insight| insight.priority);
  insights
}

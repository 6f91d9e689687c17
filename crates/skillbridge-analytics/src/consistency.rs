//! Consistency and streak tracking over attendance days.
//!
//! The tracker never recomputes attendance math: each record's consistency
//! score was derived when the record was written. This module only orders,
//! aggregates and rolls those scores up.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use skillbridge_core::{
  DateRange,
  attendance::{AttendanceRecord, AttendanceStatus},
};
use uuid::Uuid;

use crate::{
  insight::{self, Insight, InsightCategory, InsightLevel, Priority, Rule},
  round2,
};

/// A day counts toward a streak iff its consistency score is at least this.
pub const STREAK_THRESHOLD: u8 = 70;
/// Weeks averaging below this are flagged.
pub const LOW_CONSISTENCY_WEEK: f64 = 50.0;

const STRONG_RATE: u32 = 90;
const WEAK_RATE: u32 = 70;
const STREAK_CELEBRATION: u32 = 7;
const LOW_WEEKS_SHOWN: usize = 3;

// ─── Streaks ─────────────────────────────────────────────────────────────────

/// Running streak over chronologically ordered consistency scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakCounter {
  current: u32,
  longest: u32,
}

impl StreakCounter {
  /// Feed the next day's score and return the counter value after it.
  ///
  /// A qualifying day increments the counter; any other day resets it to 0.
  pub fn advance(&mut self, consistency_score: u8) -> u32 {
    if consistency_score >= STREAK_THRESHOLD {
      self.current += 1;
      self.longest = self.longest.max(self.current);
    } else {
      self.current = 0;
    }
    self.current
  }

  pub fn current(&self) -> u32 { self.current }

  pub fn longest(&self) -> u32 { self.longest }
}

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyConsistency {
  pub date:                  NaiveDate,
  pub subject_id:            Uuid,
  pub consistency_score:     u8,
  pub attendance_status:     AttendanceStatus,
  pub assignments_submitted: u32,
  pub assignments_total:     u32,
  /// Streak counter value after this day.
  pub streak:                u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsistencyStatistics {
  pub total_days:            u32,
  pub present_days:          u32,
  /// Percent of days present, rounded.
  pub attendance_rate:       u32,
  pub assignments_due:       u32,
  pub assignments_submitted: u32,
  /// Percent of due assignments submitted, rounded; 0 when none were due.
  pub submission_rate:       u32,
  pub average_consistency:   f64,
  pub current_streak:        u32,
  pub longest_streak:        u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyConsistency {
  /// ISO-8601 week label, e.g. `"2026-W10"`.
  pub week:                String,
  /// Monday of the ISO week.
  pub week_start:          NaiveDate,
  pub days:                u32,
  pub average_consistency: f64,
  pub attendance_rate:     u32,
  pub low_consistency:     bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
  pub counterpart_id: Uuid,
  pub subject_id:     Option<Uuid>,
  pub range:          DateRange,
  pub days:           Vec<DailyConsistency>,
  pub statistics:     ConsistencyStatistics,
  pub weeks:          Vec<WeeklyConsistency>,
  pub insights:       Vec<Insight>,
}

// ─── Tracking ────────────────────────────────────────────────────────────────

fn rate(part: u32, whole: u32) -> u32 {
  if whole == 0 {
    0
  } else {
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
  }
}

/// Build the consistency report for `counterpart_id` over `range`.
///
/// One entry is produced per matching attendance record; days without a
/// record are not filled in.
pub fn track_consistency(
  counterpart_id: Uuid,
  range: DateRange,
  subject_id: Option<Uuid>,
  records: &[AttendanceRecord],
) -> ConsistencyReport {
  let mut sorted: Vec<&AttendanceRecord> = records
    .iter()
    .filter(|r| {
      r.counterpart_id == counterpart_id
        && range.contains_date(r.date)
        && subject_id.is_none_or(|s| s == r.subject_id)
    })
    .collect();
  sorted.sort_by_key(|r| (r.date, r.subject_id));

  let mut streak = StreakCounter::default();
  let days: Vec<DailyConsistency> = sorted
    .iter()
    .map(|r| DailyConsistency {
      date:                  r.date,
      subject_id:            r.subject_id,
      consistency_score:     r.consistency_score(),
      attendance_status:     r.summary.status,
      assignments_submitted: r.summary.assignments_submitted,
      assignments_total:     r.summary.assignments_total,
      streak:                streak.advance(r.consistency_score()),
    })
    .collect();

  let statistics = aggregate(&sorted, streak);
  let weeks = weekly_rollup(&sorted);

  let facts = ConsistencyFacts {
    total_days:      statistics.total_days,
    attendance_rate: statistics.attendance_rate,
    assignments_due: statistics.assignments_due,
    submission_rate: statistics.submission_rate,
    current_streak:  statistics.current_streak,
    low_weeks:       weeks
      .iter()
      .filter(|w| w.low_consistency)
      .map(|w| w.week.clone())
      .collect(),
  };
  let insights = insight::evaluate(CONSISTENCY_RULES, &facts);

  ConsistencyReport {
    counterpart_id,
    subject_id,
    range,
    days,
    statistics,
    weeks,
    insights,
  }
}

fn aggregate(
  records: &[&AttendanceRecord],
  streak: StreakCounter,
) -> ConsistencyStatistics {
  if records.is_empty() {
    return ConsistencyStatistics::default();
  }

  let total_days = records.len() as u32;
  let present_days = records.iter().filter(|r| r.is_present()).count() as u32;
  let assignments_due: u32 =
    records.iter().map(|r| r.summary.assignments_total).sum();
  let assignments_submitted: u32 =
    records.iter().map(|r| r.summary.assignments_submitted).sum();
  let consistency_sum: u32 =
    records.iter().map(|r| u32::from(r.consistency_score())).sum();

  ConsistencyStatistics {
    total_days,
    present_days,
    attendance_rate: rate(present_days, total_days),
    assignments_due,
    assignments_submitted,
    submission_rate: rate(assignments_submitted, assignments_due),
    average_consistency: round2(f64::from(consistency_sum) / f64::from(total_days)),
    current_streak: streak.current(),
    longest_streak: streak.longest(),
  }
}

#[derive(Default)]
struct WeekAccumulator {
  days:            u32,
  present:         u32,
  consistency_sum: u32,
}

fn weekly_rollup(records: &[&AttendanceRecord]) -> Vec<WeeklyConsistency> {
  let mut weeks: BTreeMap<(i32, u32), WeekAccumulator> = BTreeMap::new();
  for record in records {
    let iso = record.date.iso_week();
    let acc = weeks.entry((iso.year(), iso.week())).or_default();
    acc.days += 1;
    acc.present += u32::from(record.is_present());
    acc.consistency_sum += u32::from(record.consistency_score());
  }

  weeks
    .into_iter()
    .filter_map(|((year, week), acc)| {
      let week_start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
      let average_consistency =
        round2(f64::from(acc.consistency_sum) / f64::from(acc.days));
      Some(WeeklyConsistency {
        week: format!("{year}-W{week:02}"),
        week_start,
        days: acc.days,
        average_consistency,
        attendance_rate: rate(acc.present, acc.days),
        low_consistency: average_consistency < LOW_CONSISTENCY_WEEK,
      })
    })
    .collect()
}

// ─── Insights ────────────────────────────────────────────────────────────────

struct ConsistencyFacts {
  total_days:      u32,
  attendance_rate: u32,
  assignments_due: u32,
  submission_rate: u32,
  current_streak:  u32,
  low_weeks:       Vec<String>,
}

const CONSISTENCY_RULES: &[Rule<ConsistencyFacts>] = &[
  Rule {
    when: |f| f.total_days == 0,
    emit: |_| {
      Insight::new(
        InsightCategory::Attendance,
        InsightLevel::Info,
        Priority::Medium,
        "No attendance data",
        "No attendance was recorded in the selected period.",
      )
    },
  },
  Rule {
    when: |f| f.total_days > 0 && f.attendance_rate >= STRONG_RATE,
    emit: |f| {
      Insight::new(
        InsightCategory::Attendance,
        InsightLevel::Success,
        Priority::Medium,
        "Excellent attendance",
        format!("Attendance rate is {}%.", f.attendance_rate),
      )
    },
  },
  Rule {
    when: |f| f.total_days > 0 && f.attendance_rate < WEAK_RATE,
    emit: |f| {
      Insight::new(
        InsightCategory::Attendance,
        InsightLevel::Warning,
        Priority::High,
        "Low attendance",
        format!(
          "Attendance rate is {}%; follow up on missed sessions.",
          f.attendance_rate
        ),
      )
    },
  },
  Rule {
    when: |f| f.assignments_due > 0 && f.submission_rate >= STRONG_RATE,
    emit: |f| {
      Insight::new(
        InsightCategory::Submission,
        InsightLevel::Success,
        Priority::Medium,
        "Assignments on track",
        format!("{}% of due assignments were submitted.", f.submission_rate),
      )
    },
  },
  Rule {
    when: |f| f.assignments_due > 0 && f.submission_rate < WEAK_RATE,
    emit: |f| {
      Insight::new(
        InsightCategory::Submission,
        InsightLevel::Warning,
        Priority::High,
        "Missing assignments",
        format!(
          "Only {}% of due assignments were submitted.",
          f.submission_rate
        ),
      )
    },
  },
  Rule {
    when: |f| f.current_streak >= STREAK_CELEBRATION,
    emit: |f| {
      Insight::new(
        InsightCategory::Consistency,
        InsightLevel::Success,
        Priority::Low,
        "Consistency streak",
        format!("{} consistent days in a row.", f.current_streak),
      )
    },
  },
  Rule {
    when: |f| !f.low_weeks.is_empty(),
    emit: |f| {
      let shown = f
        .low_weeks
        .iter()
        .take(LOW_WEEKS_SHOWN)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
      let hidden = f.low_weeks.len().saturating_sub(LOW_WEEKS_SHOWN);
      let message = if hidden > 0 {
        format!("Consistency dropped below 50 in {shown} and {hidden} more.")
      } else {
        format!("Consistency dropped below 50 in {shown}.")
      };
      Insight::new(
        InsightCategory::Consistency,
        InsightLevel::Info,
        Priority::Medium,
        "Low-consistency weeks",
        message,
      )
    },
  },
];

//! Activity heatmap: engagement grouped by day of week and hour of day.
//!
//! The output grid is always complete — 7 × 24 = 168 cells in `(day, hour)`
//! ascending order — because consumers render it as a fixed matrix. Cells
//! with no records are present with all-zero values.

use std::collections::HashSet;

use serde::Serialize;
use skillbridge_core::{DateRange, engagement::EngagementRecord};
use uuid::Uuid;

use crate::{
  insight::{self, Insight, InsightCategory, InsightLevel, Priority, Rule},
  round2,
};

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;
pub const CELL_COUNT: usize = DAYS_PER_WEEK * HOURS_PER_DAY;

const DAY_NAMES: [&str; DAYS_PER_WEEK] = [
  "Sunday",
  "Monday",
  "Tuesday",
  "Wednesday",
  "Thursday",
  "Friday",
  "Saturday",
];

const LOW_ENGAGEMENT: f64 = 40.0;
const HIGH_ENGAGEMENT: f64 = 75.0;

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
  /// 0 = Sunday.
  pub day_of_week:            u8,
  pub hour_of_day:            u8,
  pub activity_count:         u32,
  /// Mean engagement score of the cell's records; 0 when empty.
  pub average_engagement:     f64,
  pub total_duration_minutes: u64,
  pub unique_subjects:        u32,
  pub sessions_attended:      u32,
  pub assignments_submitted:  u32,
}

impl HeatmapCell {
  fn empty(day_of_week: u8, hour_of_day: u8) -> Self {
    Self {
      day_of_week,
      hour_of_day,
      activity_count: 0,
      average_engagement: 0.0,
      total_duration_minutes: 0,
      unique_subjects: 0,
      sessions_attended: 0,
      assignments_submitted: 0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakSlot {
  pub day_of_week:    u8,
  pub day_name:       &'static str,
  pub hour_of_day:    u8,
  pub activity_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSummary {
  pub total_activities:   u32,
  /// Mean of the per-cell averages over cells that have data.
  pub average_engagement: f64,
  /// Busiest cell; `None` when there is no activity at all.
  pub peak:               Option<PeakSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityHeatmap {
  pub counterpart_id: Uuid,
  pub range:          DateRange,
  pub cells:          Vec<HeatmapCell>,
  pub summary:        HeatmapSummary,
  pub insights:       Vec<Insight>,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct CellAccumulator {
  count:       u32,
  score_sum:   u64,
  duration:    u64,
  subjects:    HashSet<Uuid>,
  sessions:    u32,
  assignments: u32,
}

fn cell_index(day: u8, hour: u8) -> usize {
  usize::from(day) * HOURS_PER_DAY + usize::from(hour)
}

/// Build the complete 168-cell heatmap for `counterpart_id` over `range`.
///
/// Records outside the range or for another counterpart are ignored.
pub fn build_heatmap(
  counterpart_id: Uuid,
  range: DateRange,
  records: &[EngagementRecord],
) -> ActivityHeatmap {
  let mut acc: Vec<CellAccumulator> =
    (0..CELL_COUNT).map(|_| CellAccumulator::default()).collect();

  for record in records
    .iter()
    .filter(|r| r.counterpart_id == counterpart_id && range.contains(r.occurred_at))
  {
    let cell = &mut acc[cell_index(record.day_of_week(), record.hour_of_day())];
    cell.count += 1;
    cell.score_sum += u64::from(record.engagement_score);
    cell.duration += u64::from(record.activity.duration_minutes);
    cell.subjects.insert(record.subject_id);
    cell.sessions += u32::from(record.activity.session_attended);
    cell.assignments += u32::from(record.activity.assignment_submitted);
  }

  let mut cells = Vec::with_capacity(CELL_COUNT);
  for day in 0..DAYS_PER_WEEK as u8 {
    for hour in 0..HOURS_PER_DAY as u8 {
      let a = &acc[cell_index(day, hour)];
      let mut cell = HeatmapCell::empty(day, hour);
      if a.count > 0 {
        cell.activity_count = a.count;
        cell.average_engagement =
          round2(a.score_sum as f64 / f64::from(a.count));
        cell.total_duration_minutes = a.duration;
        cell.unique_subjects = a.subjects.len() as u32;
        cell.sessions_attended = a.sessions;
        cell.assignments_submitted = a.assignments;
      }
      cells.push(cell);
    }
  }

  let summary = summarize(&cells);
  let insights = insight::evaluate(HEATMAP_RULES, &summary);

  ActivityHeatmap { counterpart_id, range, cells, summary, insights }
}

fn summarize(cells: &[HeatmapCell]) -> HeatmapSummary {
  let total_activities = cells.iter().map(|c| c.activity_count).sum();

  let active: Vec<&HeatmapCell> =
    cells.iter().filter(|c| c.activity_count > 0).collect();
  let average_engagement = if active.is_empty() {
    0.0
  } else {
    round2(
      active.iter().map(|c| c.average_engagement).sum::<f64>()
        / active.len() as f64,
    )
  };

  // Strictly-greater comparison keeps the first cell in (day, hour) order
  // on ties.
  let mut peak: Option<&HeatmapCell> = None;
  for cell in active.iter().copied() {
    if peak.is_none_or(|p| cell.activity_count > p.activity_count) {
      peak = Some(cell);
    }
  }

  HeatmapSummary {
    total_activities,
    average_engagement,
    peak: peak.map(|c| PeakSlot {
      day_of_week:    c.day_of_week,
      day_name:       DAY_NAMES[usize::from(c.day_of_week)],
      hour_of_day:    c.hour_of_day,
      activity_count: c.activity_count,
    }),
  }
}

// ─── Insights ────────────────────────────────────────────────────────────────

const HEATMAP_RULES: &[Rule<HeatmapSummary>] = &[
  Rule {
    when: |s| s.total_activities == 0,
    emit: |_| {
      Insight::new(
        InsightCategory::Engagement,
        InsightLevel::Info,
        Priority::Medium,
        "No activity recorded",
        "There is no engagement activity in the selected period.",
      )
    },
  },
  Rule {
    when: |s| s.peak.is_some(),
    emit: |s| {
      let (day, hour, count) = s
        .peak
        .as_ref()
        .map(|p| (p.day_name, p.hour_of_day, p.activity_count))
        .unwrap_or_default();
      Insight::new(
        InsightCategory::Engagement,
        InsightLevel::Info,
        Priority::Low,
        "Peak activity time",
        format!(
          "Students are most active on {day} at {hour:02}:00 ({count} activities)."
        ),
      )
    },
  },
  Rule {
    when: |s| s.total_activities > 0 && s.average_engagement < LOW_ENGAGEMENT,
    emit: |s| {
      Insight::new(
        InsightCategory::Engagement,
        InsightLevel::Warning,
        Priority::High,
        "Low engagement",
        format!(
          "Average engagement is {:.1}; consider more interactive sessions.",
          s.average_engagement
        ),
      )
    },
  },
  Rule {
    when: |s| s.average_engagement >= HIGH_ENGAGEMENT,
    emit: |s| {
      Insight::new(
        InsightCategory::Engagement,
        InsightLevel::Success,
        Priority::Medium,
        "Strong engagement",
        format!("Average engagement is {:.1}.", s.average_engagement),
      )
    },
  },
];

#[cfg(test)]
mod tests {
  use chrono::{DateTime, TimeZone, Utc};
  use pretty_assertions::assert_eq;
  use skillbridge_core::engagement::EngagementActivity;

  use super::*;

  fn range() -> DateRange {
    DateRange::new(
      Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
      Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap(),
    )
    .unwrap()
  }

  fn record(
    counterpart: Uuid,
    subject: Uuid,
    at: DateTime<Utc>,
    activity: EngagementActivity,
  ) -> EngagementRecord {
    EngagementRecord::new(Uuid::new_v4(), subject, counterpart, at, activity)
  }

  #[test]
  fn empty_input_yields_full_zero_grid() {
    let heatmap = build_heatmap(Uuid::new_v4(), range(), &[]);
    assert_eq!(heatmap.cells.len(), CELL_COUNT);
    assert!(heatmap.cells.iter().all(|c| c.activity_count == 0
      && c.average_engagement == 0.0
      && c.unique_subjects == 0));
    assert_eq!(heatmap.summary, HeatmapSummary {
      total_activities:   0,
      average_engagement: 0.0,
      peak:               None,
    });
    assert_eq!(heatmap.insights.len(), 1);
    assert_eq!(heatmap.insights[0].title, "No activity recorded");
  }

  #[test]
  fn cells_are_ordered_by_day_then_hour() {
    let heatmap = build_heatmap(Uuid::new_v4(), range(), &[]);
    assert_eq!((heatmap.cells[0].day_of_week, heatmap.cells[0].hour_of_day), (0, 0));
    assert_eq!((heatmap.cells[25].day_of_week, heatmap.cells[25].hour_of_day), (1, 1));
    assert_eq!(
      (heatmap.cells[167].day_of_week, heatmap.cells[167].hour_of_day),
      (6, 23)
    );
  }

  #[test]
  fn records_are_grouped_into_cells() {
    let tutor = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    // 2026-03-02 is a Monday.
    let monday_ten = Utc.with_ymd_and_hms(2026, 3, 2, 10, 5, 0).unwrap();
    let monday_ten_later = Utc.with_ymd_and_hms(2026, 3, 9, 10, 50, 0).unwrap();
    let tuesday_eight = Utc.with_ymd_and_hms(2026, 3, 3, 20, 0, 0).unwrap();

    let attended = EngagementActivity {
      session_attended: true,
      duration_minutes: 60,
      ..Default::default()
    };
    let submitted = EngagementActivity {
      assignment_submitted: true,
      ..Default::default()
    };

    let records = vec![
      record(tutor, alice, monday_ten, attended.clone()),
      record(tutor, bob, monday_ten_later, submitted.clone()),
      record(tutor, alice, tuesday_eight, attended.clone()),
      // Other tutor and out-of-range records are ignored.
      record(Uuid::new_v4(), alice, monday_ten, attended.clone()),
      record(
        tutor,
        alice,
        Utc.with_ymd_and_hms(2026, 4, 6, 10, 0, 0).unwrap(),
        attended,
      ),
    ];

    let heatmap = build_heatmap(tutor, range(), &records);
    let monday = &heatmap.cells[cell_index(1, 10)];
    assert_eq!(monday.activity_count, 2);
    assert_eq!(monday.unique_subjects, 2);
    assert_eq!(monday.sessions_attended, 1);
    assert_eq!(monday.assignments_submitted, 1);
    assert_eq!(monday.total_duration_minutes, 60);
    // (40 + 25) / 2
    assert_eq!(monday.average_engagement, 32.5);

    let tuesday = &heatmap.cells[cell_index(2, 20)];
    assert_eq!(tuesday.activity_count, 1);
    assert_eq!(tuesday.average_engagement, 40.0);

    assert_eq!(heatmap.summary.total_activities, 3);
    // Mean of per-cell averages, not weighted by count: (32.5 + 40) / 2
    assert_eq!(heatmap.summary.average_engagement, 36.25);
    let peak = heatmap.summary.peak.unwrap();
    assert_eq!((peak.day_of_week, peak.hour_of_day, peak.activity_count), (1, 10, 2));
    assert_eq!(peak.day_name, "Monday");
  }

  #[test]
  fn peak_ties_go_to_earliest_cell() {
    let tutor = Uuid::new_v4();
    let subject = Uuid::new_v4();
    let records = vec![
      // Saturday first in input order, Wednesday earlier in grid order.
      record(
        tutor,
        subject,
        Utc.with_ymd_and_hms(2026, 3, 7, 9, 0, 0).unwrap(),
        EngagementActivity::default(),
      ),
      record(
        tutor,
        subject,
        Utc.with_ymd_and_hms(2026, 3, 4, 15, 0, 0).unwrap(),
        EngagementActivity::default(),
      ),
    ];
    let heatmap = build_heatmap(tutor, range(), &records);
    let peak = heatmap.summary.peak.unwrap();
    assert_eq!((peak.day_of_week, peak.hour_of_day), (3, 15));
  }

  #[test]
  fn low_engagement_raises_warning_first() {
    let tutor = Uuid::new_v4();
    let records = vec![record(
      tutor,
      Uuid::new_v4(),
      Utc.with_ymd_and_hms(2026, 3, 4, 15, 0, 0).unwrap(),
      EngagementActivity { messages_sent: 1, ..Default::default() },
    )];
    let heatmap = build_heatmap(tutor, range(), &records);
    assert_eq!(heatmap.insights[0].level, InsightLevel::Warning);
    assert_eq!(heatmap.insights[0].title, "Low engagement");
    assert!(heatmap.insights.iter().any(|i| i.title == "Peak activity time"));
  }
}

//! Score distribution: histogram, descriptive statistics and outliers over
//! performance records.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use skillbridge_core::{
  DateRange,
  performance::{CategoryFilter, LetterGrade, PerformanceRecord},
};
use uuid::Uuid;

use crate::{
  Result,
  insight::{self, Insight, InsightCategory, InsightLevel, Priority, Rule},
  round2,
};

pub const DEFAULT_BIN_WIDTH: u32 = 10;
const SCORE_CEILING: u32 = 100;

/// Scores further than this many standard deviations from the mean are
/// outliers.
const OUTLIER_SIGMAS: f64 = 2.0;
const MAX_OUTLIERS: usize = 10;

const EXCELLENT_MEAN: f64 = 85.0;
const GOOD_MEAN: f64 = 70.0;
const HIGH_VARIANCE_STD_DEV: f64 = 20.0;
const HIGH_PERFORMER_FLOOR: f64 = 80.0;
const LOW_PERFORMER_CEILING: f64 = 60.0;
const PERFORMANCE_GAP_RATIO: f64 = 2.0;

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBin {
  /// e.g. `"70-79"`; the last bin is `"90-100"`.
  pub label:           String,
  pub min:             u32,
  pub max:             u32,
  pub count:           u32,
  /// Share of all filtered records, in percent.
  pub percentage:      f64,
  pub unique_subjects: u32,
  pub average_score:   f64,
  pub grades:          BTreeMap<LetterGrade, u32>,
}

/// Population statistics over the raw (unbinned) scores.
///
/// Every field is 0 for an empty population.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreStatistics {
  pub count:   usize,
  pub mean:    f64,
  pub median:  f64,
  /// Most frequent score; the smallest such score on ties.
  pub mode:    f64,
  /// Population standard deviation (divides by `n`, not `n - 1`).
  pub std_dev: f64,
  pub min:     f64,
  pub max:     f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
  pub record_id:  Uuid,
  pub subject_id: Uuid,
  pub score:      f64,
  /// `|score - mean|`.
  pub deviation:  f64,
  /// Signed distance from the mean in standard deviations.
  pub z_score:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDistribution {
  pub counterpart_id: Uuid,
  pub range:          DateRange,
  pub category:       CategoryFilter,
  pub bin_width:      u32,
  pub bins:           Vec<ScoreBin>,
  pub statistics:     ScoreStatistics,
  pub outliers:       Vec<Outlier>,
  pub insights:       Vec<Insight>,
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Descriptive statistics for `scores`, guarding the empty case.
pub fn statistics(scores: &[f64]) -> ScoreStatistics {
  if scores.is_empty() {
    return ScoreStatistics::default();
  }

  let mut sorted = scores.to_vec();
  sorted.sort_by(f64::total_cmp);

  let n = sorted.len();
  let mean = sorted.iter().sum::<f64>() / n as f64;
  let median = if n % 2 == 0 {
    (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
  } else {
    sorted[n / 2]
  };
  let variance =
    sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;

  ScoreStatistics {
    count: n,
    mean,
    median,
    mode: mode_of_sorted(&sorted),
    std_dev: variance.sqrt(),
    min: sorted[0],
    max: sorted[n - 1],
  }
}

/// Longest run in an ascending slice; strict comparison keeps the smallest
/// value on ties.
fn mode_of_sorted(sorted: &[f64]) -> f64 {
  let mut best = (sorted[0], 0usize);
  let mut i = 0;
  while i < sorted.len() {
    let value = sorted[i];
    let run = sorted[i..].iter().take_while(|s| **s == value).count();
    if run > best.1 {
      best = (value, run);
    }
    i += run;
  }
  best.0
}

// ─── Binning ─────────────────────────────────────────────────────────────────

/// Check that `bin_width` splits 0..=100 into whole bins.
pub fn validate_bin_width(bin_width: u32) -> Result<()> {
  if bin_width == 0 || SCORE_CEILING % bin_width != 0 {
    return Err(skillbridge_core::Error::UnsupportedBinWidth(bin_width).into());
  }
  Ok(())
}

fn bin_index(score: f64, bin_width: u32, bin_count: usize) -> usize {
  let index = (score / f64::from(bin_width)).floor().max(0.0) as usize;
  index.min(bin_count - 1)
}

fn build_bins(records: &[&PerformanceRecord], bin_width: u32) -> Vec<ScoreBin> {
  let bin_count = (SCORE_CEILING / bin_width) as usize;
  let mut members: Vec<Vec<&PerformanceRecord>> = vec![Vec::new(); bin_count];
  for record in records {
    members[bin_index(record.score, bin_width, bin_count)].push(record);
  }

  let total = records.len();
  members
    .into_iter()
    .enumerate()
    .map(|(i, bin)| {
      let min = i as u32 * bin_width;
      let max = if i + 1 == bin_count {
        SCORE_CEILING
      } else {
        min + bin_width - 1
      };

      let count = bin.len();
      let mut grades = BTreeMap::new();
      for record in &bin {
        *grades.entry(record.grade).or_insert(0) += 1;
      }
      let unique_subjects =
        bin.iter().map(|r| r.subject_id).collect::<HashSet<_>>().len();

      ScoreBin {
        label: format!("{min}-{max}"),
        min,
        max,
        count: count as u32,
        percentage: percent(count, total),
        unique_subjects: unique_subjects as u32,
        average_score: if count == 0 {
          0.0
        } else {
          round2(bin.iter().map(|r| r.score).sum::<f64>() / count as f64)
        },
        grades,
      }
    })
    .collect()
}

fn percent(part: usize, whole: usize) -> f64 {
  if whole == 0 {
    0.0
  } else {
    round2(part as f64 / whole as f64 * 100.0)
  }
}

// ─── Analysis ────────────────────────────────────────────────────────────────

/// Analyze the score distribution of `counterpart_id`'s records in `range`.
///
/// Fails only when `bin_width` does not evenly divide 100.
pub fn analyze_distribution(
  counterpart_id: Uuid,
  range: DateRange,
  category: CategoryFilter,
  bin_width: u32,
  records: &[PerformanceRecord],
) -> Result<ScoreDistribution> {
  validate_bin_width(bin_width)?;

  let filtered: Vec<&PerformanceRecord> = records
    .iter()
    .filter(|r| {
      r.counterpart_id == counterpart_id
        && range.contains(r.recorded_at)
        && category.matches(r.category)
    })
    .collect();

  let scores: Vec<f64> = filtered.iter().map(|r| r.score).collect();
  let statistics = statistics(&scores);
  let bins = build_bins(&filtered, bin_width);
  let outliers = find_outliers(&filtered, &statistics);

  let facts = PerformanceFacts {
    count:           statistics.count,
    mean:            statistics.mean,
    std_dev:         statistics.std_dev,
    high_performers: count_where(&scores, |s| s >= HIGH_PERFORMER_FLOOR),
    low_performers:  count_where(&scores, |s| s < LOW_PERFORMER_CEILING),
  };
  let insights = insight::evaluate(DISTRIBUTION_RULES, &facts);

  Ok(ScoreDistribution {
    counterpart_id,
    range,
    category,
    bin_width,
    bins,
    statistics,
    outliers,
    insights,
  })
}

fn count_where(scores: &[f64], pred: impl Fn(f64) -> bool) -> u32 {
  scores.iter().filter(|s| pred(**s)).count() as u32
}

/// Records more than two standard deviations from the mean, in input
/// order, at most ten.
fn find_outliers(
  records: &[&PerformanceRecord],
  stats: &ScoreStatistics,
) -> Vec<Outlier> {
  if stats.std_dev == 0.0 {
    return Vec::new();
  }
  records
    .iter()
    .filter(|r| (r.score - stats.mean).abs() > OUTLIER_SIGMAS * stats.std_dev)
    .take(MAX_OUTLIERS)
    .map(|r| Outlier {
      record_id:  r.record_id,
      subject_id: r.subject_id,
      score:      r.score,
      deviation:  round2((r.score - stats.mean).abs()),
      z_score:    round2((r.score - stats.mean) / stats.std_dev),
    })
    .collect()
}

// ─── Insights ────────────────────────────────────────────────────────────────

struct PerformanceFacts {
  count:           usize,
  mean:            f64,
  std_dev:         f64,
  high_performers: u32,
  low_performers:  u32,
}

const DISTRIBUTION_RULES: &[Rule<PerformanceFacts>] = &[
  Rule {
    when: |f| f.count == 0,
    emit: |_| {
      Insight::new(
        InsightCategory::Performance,
        InsightLevel::Info,
        Priority::Medium,
        "No performance data",
        "No graded results were recorded in the selected period.",
      )
    },
  },
  Rule {
    when: |f| f.count > 0 && f.mean < GOOD_MEAN,
    emit: |f| {
      Insight::new(
        InsightCategory::Performance,
        InsightLevel::Warning,
        Priority::High,
        "Performance below target",
        format!(
          "Average score is {:.1}; consider additional support for struggling students.",
          f.mean
        ),
      )
    },
  },
  Rule {
    when: |f| f.count > 0 && f.mean >= EXCELLENT_MEAN,
    emit: |f| {
      Insight::new(
        InsightCategory::Performance,
        InsightLevel::Success,
        Priority::Medium,
        "Excellent performance",
        format!("Average score is {:.1}.", f.mean),
      )
    },
  },
  Rule {
    when: |f| f.count > 0 && (GOOD_MEAN..EXCELLENT_MEAN).contains(&f.mean),
    emit: |f| {
      Insight::new(
        InsightCategory::Performance,
        InsightLevel::Info,
        Priority::Medium,
        "Good performance",
        format!("Average score is {:.1}.", f.mean),
      )
    },
  },
  Rule {
    when: |f| f.std_dev > HIGH_VARIANCE_STD_DEV,
    emit: |f| {
      Insight::new(
        InsightCategory::Performance,
        InsightLevel::Warning,
        Priority::Medium,
        "High score variance",
        format!(
          "Scores vary widely (standard deviation {:.1}); results are uneven across students.",
          f.std_dev
        ),
      )
    },
  },
  Rule {
    when: |f| {
      f.high_performers > 0
        && f.low_performers > 0
        && f64::from(f.high_performers) / f64::from(f.low_performers)
          > PERFORMANCE_GAP_RATIO
    },
    emit: |f| {
      Insight::new(
        InsightCategory::Performance,
        InsightLevel::Info,
        Priority::Low,
        "Significant performance gap",
        format!(
          "{} results scored 80 or above against {} below 60.",
          f.high_performers, f.low_performers
        ),
      )
    },
  },
];

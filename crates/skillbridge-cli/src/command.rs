//! Subcommands and their execution against a [`SqliteStore`].

use std::{
  io::{self, Read as _},
  path::PathBuf,
};

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use serde::{Serialize, de::DeserializeOwned};
use skillbridge_analytics::Analytics;
use skillbridge_core::{
  DateRange,
  attendance::AttendancePayload,
  engagement::NewEngagement,
  performance::{CategoryFilter, NewPerformance},
  profile::ProfileBundle,
  store::FactStore,
};
use skillbridge_store_sqlite::SqliteStore;
use tracing::info;
use uuid::Uuid;

// ─── Arguments ───────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Record an engagement observation (JSON `NewEngagement`).
  RecordEngagement(InputArg),

  /// Record a graded outcome (JSON `NewPerformance`).
  RecordPerformance(InputArg),

  /// Insert or replace one attendance day (JSON `AttendancePayload`).
  UpsertAttendance {
    #[arg(long)]
    subject:     Uuid,
    #[arg(long)]
    counterpart: Uuid,
    /// Calendar day, `YYYY-MM-DD`.
    #[arg(long)]
    date:        NaiveDate,
    #[command(flatten)]
    input:       InputArg,
  },

  /// Load a JSON snapshot bundle of skills, profiles and locations.
  ImportProfiles(InputArg),

  /// Day-of-week × hour-of-day activity heatmap.
  Heatmap {
    #[arg(long)]
    counterpart: Uuid,
    #[command(flatten)]
    window:      Window,
  },

  /// Score histogram, statistics and outliers.
  Distribution {
    #[arg(long)]
    counterpart: Uuid,
    #[command(flatten)]
    window:      Window,
    /// Performance category, or `all`.
    #[arg(long, default_value = "all")]
    category:    CategoryFilter,
    /// Histogram bin width; must evenly divide 100.
    #[arg(long)]
    bin_width:   Option<u32>,
  },

  /// Consistency days, streaks and weekly rollups.
  Consistency {
    #[arg(long)]
    counterpart: Uuid,
    #[command(flatten)]
    window:      Window,
    /// Restrict to a single subject.
    #[arg(long)]
    subject:     Option<Uuid>,
  },

  /// Rank every tutor of a skill for a learner.
  MatchTutors {
    #[arg(long)]
    skill:   Uuid,
    #[arg(long)]
    learner: Uuid,
    #[arg(long)]
    limit:   Option<usize>,
  },

  /// Tutor-fit and learner-fit scores for one pairing.
  LearnerFit {
    #[arg(long)]
    skill:   Uuid,
    #[arg(long)]
    tutor:   Uuid,
    #[arg(long)]
    learner: Uuid,
  },

  /// Skills a user is not yet learning, best first.
  RecommendSkills {
    #[arg(long)]
    user:    Uuid,
    /// Skill ids to leave out; repeatable.
    #[arg(long)]
    exclude: Vec<Uuid>,
    #[arg(long)]
    limit:   Option<usize>,
  },
}

#[derive(Args, Debug)]
pub struct InputArg {
  /// JSON input file; reads stdin when omitted or `-`.
  #[arg(short, long, value_name = "FILE")]
  input: Option<PathBuf>,
}

impl InputArg {
  fn read<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
    let raw = match &self.input {
      Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?,
      _ => {
        let mut buf = String::new();
        io::stdin()
          .read_to_string(&mut buf)
          .context("reading stdin")?;
        buf
      }
    };
    serde_json::from_str(&raw).context("parsing JSON input")
  }
}

/// The analysis window: `--from`/`--to`, or the last `--days` days.
#[derive(Args, Debug)]
pub struct Window {
  /// Window start: RFC 3339 instant or `YYYY-MM-DD` (start of day, UTC).
  #[arg(long, value_parser = parse_instant)]
  from: Option<DateTime<Utc>>,
  /// Window end; defaults to now. A bare date means the end of that day.
  #[arg(long, value_parser = parse_instant_end)]
  to:   Option<DateTime<Utc>>,
  /// Window length when `--from` is absent.
  #[arg(long, conflicts_with = "from")]
  days: Option<u32>,
}

impl Window {
  pub fn resolve(&self, default_days: u32) -> anyhow::Result<DateRange> {
    let end = self.to.unwrap_or_else(Utc::now);
    match self.from {
      Some(start) => Ok(DateRange::new(start, end)?),
      None => {
        let days = self.days.unwrap_or(default_days);
        Ok(DateRange::last_days(end, days)?)
      }
    }
  }
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
  parse_bound(s, false)
}

fn parse_instant_end(s: &str) -> Result<DateTime<Utc>, String> {
  parse_bound(s, true)
}

fn parse_bound(s: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    let time = if end_of_day {
      date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
      date.and_hms_opt(0, 0, 0)
    };
    return time
      .map(|t| t.and_utc())
      .ok_or_else(|| format!("invalid date: {s}"));
  }
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| format!("expected RFC 3339 instant or YYYY-MM-DD: {e}"))
}

// ─── Execution ───────────────────────────────────────────────────────────────

pub struct Context {
  pub store:               SqliteStore,
  pub default_window_days: u32,
  pub pretty:              bool,
}

impl Context {
  fn emit<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
    let out = if self.pretty {
      serde_json::to_string_pretty(value)?
    } else {
      serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
  }
}

pub async fn run(command: Command, ctx: Context) -> anyhow::Result<()> {
  let analytics = Analytics::new(ctx.store.clone());
  let days = ctx.default_window_days;

  match command {
    Command::RecordEngagement(input) => {
      let new: NewEngagement = input.read()?;
      let record = ctx
        .store
        .record_engagement(new)
        .await
        .context("recording engagement")?;
      ctx.emit(&record)
    }

    Command::RecordPerformance(input) => {
      let new: NewPerformance = input.read()?;
      let record = ctx
        .store
        .record_performance(new)
        .await
        .context("recording performance")?;
      ctx.emit(&record)
    }

    Command::UpsertAttendance { subject, counterpart, date, input } => {
      let payload: AttendancePayload = input.read()?;
      let record = ctx
        .store
        .upsert_attendance(subject, counterpart, date, payload)
        .await
        .context("upserting attendance")?;
      ctx.emit(&record)
    }

    Command::ImportProfiles(input) => {
      let bundle: ProfileBundle = input.read()?;
      let written = ctx
        .store
        .import_profiles(bundle)
        .await
        .context("importing profiles")?;
      info!(written, "import complete");
      ctx.emit(&serde_json::json!({ "written": written }))
    }

    Command::Heatmap { counterpart, window } => {
      let range = window.resolve(days)?;
      let heatmap = analytics.activity_heatmap(counterpart, range).await?;
      ctx.emit(&heatmap)
    }

    Command::Distribution { counterpart, window, category, bin_width } => {
      let range = window.resolve(days)?;
      let dist = analytics
        .score_distribution(counterpart, range, category, bin_width)
        .await?;
      ctx.emit(&dist)
    }

    Command::Consistency { counterpart, window, subject } => {
      let range = window.resolve(days)?;
      let report = analytics
        .consistency_report(counterpart, range, subject)
        .await?;
      ctx.emit(&report)
    }

    Command::MatchTutors { skill, learner, limit } => {
      let ranked = analytics.rank_tutors(skill, learner, limit).await?;
      ctx.emit(&ranked)
    }

    Command::LearnerFit { skill, tutor, learner } => {
      let pair = analytics.pair_fit(skill, tutor, learner).await?;
      ctx.emit(&pair)
    }

    Command::RecommendSkills { user, exclude, limit } => {
      let recs = analytics.recommend_skills(user, &exclude, limit).await?;
      ctx.emit(&recs)
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn bare_dates_cover_whole_days() {
    let start = parse_instant("2026-03-01").unwrap();
    let end = parse_instant_end("2026-03-31").unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    assert_eq!(
      end,
      Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap()
        + chrono::Duration::microseconds(999_999)
    );
  }

  #[test]
  fn rfc3339_instants_are_normalised_to_utc() {
    let at = parse_instant("2026-03-01T10:00:00+02:00").unwrap();
    assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
    assert!(parse_instant("yesterday").is_err());
  }

  #[test]
  fn window_defaults_to_trailing_days() {
    let to = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
    let window = Window { from: None, to: Some(to), days: None };
    let range = window.resolve(30).unwrap();
    assert_eq!(range.start(), Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    assert_eq!(range.end(), to);
  }

  #[test]
  fn oversized_trailing_window_is_rejected() {
    let to = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
    let window = Window { from: None, to: Some(to), days: Some(100_000_000) };
    let err = window.resolve(30).unwrap_err();
    assert!(matches!(
      err.downcast_ref::<skillbridge_core::Error>(),
      Some(skillbridge_core::Error::WindowTooLarge { .. })
    ));

    let defaulted = Window { from: None, to: Some(to), days: None };
    assert!(defaulted.resolve(u32::MAX).is_err());
  }

  #[test]
  fn reversed_window_is_rejected() {
    let window = Window {
      from: Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()),
      to:   Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()),
      days: None,
    };
    assert!(window.resolve(30).is_err());
  }
}

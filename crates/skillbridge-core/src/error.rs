//! Error types for `skillbridge-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date range: start {start} is after end {end}")]
  InvalidRange {
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  },

  #[error("unknown performance category: {0:?}")]
  UnknownCategory(String),

  #[error("unsupported bin width {0}: must evenly divide 100")]
  UnsupportedBinWidth(u32),

  #[error("score {0} is outside 0..=100")]
  ScoreOutOfRange(f64),

  #[error("a {days}-day window ending at {end} starts before the earliest supported date")]
  WindowTooLarge { days: u32, end: DateTime<Utc> },

  #[error("invalid attendance payload: {0}")]
  InvalidAttendance(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

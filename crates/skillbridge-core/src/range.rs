//! Inclusive instant ranges used to scope every aggregation query.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A closed `[start, end]` interval of UTC instants.
///
/// Construction fails when `start > end`; a reversed range is a caller
/// contract violation and is never silently swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  start: DateTime<Utc>,
  end:   DateTime<Utc>,
}

impl DateRange {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidRange { start, end });
    }
    Ok(Self { start, end })
  }

  /// The `days`-long window ending at `end`.
  ///
  /// Fails when the start would fall outside the representable calendar.
  pub fn last_days(end: DateTime<Utc>, days: u32) -> Result<Self> {
    let start = TimeDelta::try_days(i64::from(days))
      .and_then(|span| end.checked_sub_signed(span))
      .ok_or(Error::WindowTooLarge { days, end })?;
    Ok(Self { start, end })
  }

  pub fn start(&self) -> DateTime<Utc> { self.start }

  pub fn end(&self) -> DateTime<Utc> { self.end }

  pub fn start_date(&self) -> NaiveDate { self.start.date_naive() }

  pub fn end_date(&self) -> NaiveDate { self.end.date_naive() }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at <= self.end
  }

  /// Calendar-date containment, inclusive of both boundary days.
  pub fn contains_date(&self, date: NaiveDate) -> bool {
    self.start_date() <= date && date <= self.end_date()
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn reversed_range_is_rejected() {
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let err = DateRange::new(start, end).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
  }

  #[test]
  fn single_instant_range_is_valid() {
    let at = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
    let range = DateRange::new(at, at).unwrap();
    assert!(range.contains(at));
  }

  #[test]
  fn date_containment_covers_boundary_days() {
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 4, 6, 0, 0).unwrap();
    let range = DateRange::new(start, end).unwrap();

    assert!(range.contains_date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
    assert!(range.contains_date(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()));
    assert!(!range.contains_date(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()));
    assert!(!range.contains(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()));
  }

  #[test]
  fn last_days_ends_at_given_instant() {
    let end = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
    let range = DateRange::last_days(end, 30).unwrap();
    assert_eq!(range.end(), end);
    assert_eq!(range.start_date(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
  }

  #[test]
  fn oversized_window_is_an_error() {
    let end = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
    let err = DateRange::last_days(end, 100_000_000).unwrap_err();
    assert!(matches!(err, Error::WindowTooLarge { days: 100_000_000, .. }));

    let zero = DateRange::last_days(end, 0).unwrap();
    assert_eq!(zero.start(), end);
  }
}

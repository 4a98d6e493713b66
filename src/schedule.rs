//! Target date selection.
//!
//! TİAK publishes on weekdays. A run on Tuesday–Friday targets yesterday,
//! a run on Monday catches up on Friday through Sunday, and weekend runs
//! do nothing.

use anyhow::Result;
use chrono::{Datelike, Duration, FixedOffset, NaiveDate, Utc, Weekday};

/// Upper bound on dates processed by a single run
pub const MAX_TARGETS: usize = 7;

/// Today's date in the source's local time
pub fn source_today(utc_offset_hours: i32) -> Result<NaiveDate> {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .ok_or_else(|| anyhow::anyhow!("Invalid UTC offset: {}h", utc_offset_hours))?;
    Ok(Utc::now().with_timezone(&offset).date_naive())
}

/// Default targets for a run on `today`, oldest first
pub fn default_targets(today: NaiveDate) -> Vec<NaiveDate> {
    match today.weekday() {
        Weekday::Sat | Weekday::Sun => Vec::new(),
        Weekday::Mon => (1..=3).rev().map(|back| today - Duration::days(back)).collect(),
        _ => vec![today - Duration::days(1)],
    }
}

/// The `days` dates ending yesterday, oldest first
pub fn last_days(today: NaiveDate, days: usize) -> Result<Vec<NaiveDate>> {
    if days == 0 || days > MAX_TARGETS {
        anyhow::bail!("--days must be between 1 and {}", MAX_TARGETS);
    }
    Ok((1..=days as i64)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect())
}

/// Resolve the dates for one run.
///
/// Explicit dates win over `days`, which wins over the weekday rules.
/// Explicit dates are sorted, deduplicated and must lie before `today`.
pub fn plan_targets(
    today: NaiveDate,
    explicit: &[NaiveDate],
    days: Option<usize>,
) -> Result<Vec<NaiveDate>> {
    if !explicit.is_empty() {
        let mut dates = explicit.to_vec();
        dates.sort();
        dates.dedup();

        if dates.len() > MAX_TARGETS {
            anyhow::bail!("At most {} dates per run, got {}", MAX_TARGETS, dates.len());
        }
        if let Some(future) = dates.iter().find(|d| **d >= today) {
            anyhow::bail!("No data is published yet for {}", future);
        }
        return Ok(dates);
    }

    match days {
        Some(days) => last_days(today, days),
        None => Ok(default_targets(today)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday_targets_yesterday() {
        // 2025-03-05 is a Wednesday
        assert_eq!(default_targets(date(2025, 3, 5)), vec![date(2025, 3, 4)]);
        // Tuesday targets Monday
        assert_eq!(default_targets(date(2025, 3, 4)), vec![date(2025, 3, 3)]);
    }

    #[test]
    fn test_weekend_has_no_targets() {
        assert!(default_targets(date(2025, 3, 8)).is_empty()); // Saturday
        assert!(default_targets(date(2025, 3, 9)).is_empty()); // Sunday
    }

    #[test]
    fn test_monday_backfills_weekend() {
        // 2025-03-10 is a Monday
        assert_eq!(
            default_targets(date(2025, 3, 10)),
            vec![date(2025, 3, 7), date(2025, 3, 8), date(2025, 3, 9)]
        );
    }

    #[test]
    fn test_monday_across_month_boundary() {
        // 2025-09-01 is a Monday
        assert_eq!(
            default_targets(date(2025, 9, 1)),
            vec![date(2025, 8, 29), date(2025, 8, 30), date(2025, 8, 31)]
        );
    }

    #[test]
    fn test_last_days() {
        let targets = last_days(date(2025, 3, 8), 2).unwrap();
        assert_eq!(targets, vec![date(2025, 3, 6), date(2025, 3, 7)]);
        assert!(last_days(date(2025, 3, 8), 0).is_err());
        assert!(last_days(date(2025, 3, 8), MAX_TARGETS + 1).is_err());
    }

    #[test]
    fn test_explicit_dates_override_weekend() {
        let today = date(2025, 3, 8);
        let targets = plan_targets(today, &[date(2025, 3, 6), date(2025, 3, 3), date(2025, 3, 6)], None)
            .unwrap();
        assert_eq!(targets, vec![date(2025, 3, 3), date(2025, 3, 6)]);
    }

    #[test]
    fn test_explicit_dates_must_be_past() {
        let today = date(2025, 3, 5);
        assert!(plan_targets(today, &[today], None).is_err());
    }

    #[test]
    fn test_plan_defaults() {
        assert!(plan_targets(date(2025, 3, 8), &[], None).unwrap().is_empty());
        assert_eq!(plan_targets(date(2025, 3, 10), &[], None).unwrap().len(), 3);
        assert_eq!(plan_targets(date(2025, 3, 8), &[], Some(1)).unwrap(), vec![date(2025, 3, 7)]);
    }

    #[test]
    fn test_source_today_rejects_bad_offset() {
        assert!(source_today(3).is_ok());
        assert!(source_today(30).is_err());
    }
}

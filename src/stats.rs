//! # Stats Module
//!
//! Folds billing records into overlapping reporting windows. Each record is
//! tested independently against every window, so one record may count toward
//! yesterday, the trailing week and the plan period at once.

use chrono::{DateTime, Duration, Local, Months, NaiveTime, TimeZone, Utc};

use crate::models::{BillingRecord, ExpiryInfo, UsageStats};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Aggregate against the local wall clock
pub fn aggregate(
    records: &[BillingRecord],
    plan_start: DateTime<Utc>,
    plan_end: DateTime<Utc>,
) -> UsageStats {
    aggregate_at(records, plan_start, plan_end, Local::now())
}

/// Aggregate as of `now`; "yesterday" is anchored to midnight in `now`'s time zone.
///
/// - yesterday: `[midnight - 24h, midnight)`, today excluded since same-day
///   billing is still settling
/// - weekly: `[now - 7d, now]`
/// - plan: `[plan_start, plan_end]`
pub fn aggregate_at<Tz: TimeZone>(
    records: &[BillingRecord],
    plan_start: DateTime<Utc>,
    plan_end: DateTime<Utc>,
    now: DateTime<Tz>,
) -> UsageStats {
    let now_ms = now.timestamp_millis();
    let midnight_ms = local_midnight(&now).timestamp_millis();
    let yesterday = (midnight_ms - DAY_MS, midnight_ms);
    let week = (now_ms - WEEK_MS, now_ms);
    let plan = (plan_start.timestamp_millis(), plan_end.timestamp_millis());

    let mut stats = UsageStats::default();
    for record in records {
        let ts = record.created_at_millis();
        let tokens = record.consumed_tokens;
        if ts >= yesterday.0 && ts < yesterday.1 {
            stats.last_day_usage = stats.last_day_usage.saturating_add(tokens);
        }
        if ts >= week.0 && ts <= week.1 {
            stats.weekly_usage = stats.weekly_usage.saturating_add(tokens);
        }
        if ts >= plan.0 && ts <= plan.1 {
            stats.plan_total_usage = stats.plan_total_usage.saturating_add(tokens);
        }
    }
    stats
}

/// Start of `now`'s calendar day in its own time zone
fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let naive = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        // Midnight skipped by a DST jump: fall back to subtracting the time of day
        .unwrap_or_else(|| now.clone() - (now.naive_local() - naive))
}

/// Plan period bounds.
///
/// With a known expiry the period is the calendar month ending at expiry.
/// Without one it spans the oldest observed record up to `now`, so the plan
/// total degrades to all observed usage.
pub fn plan_window(
    expiry: Option<&ExpiryInfo>,
    records: &[BillingRecord],
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    if let Some(exp) = expiry {
        let start = exp
            .ends_at
            .checked_sub_months(Months::new(1))
            .unwrap_or(exp.ends_at - Duration::days(30));
        return (start, exp.ends_at);
    }
    let oldest = records
        .iter()
        .map(|r| r.created_at_seconds)
        .min()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or(now);
    (oldest.min(now), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn rec(tokens: u64, at: DateTime<Utc>) -> BillingRecord {
        BillingRecord {
            consumed_tokens: tokens,
            created_at_seconds: at.timestamp(),
        }
    }

    #[test]
    fn yesterday_excludes_today_and_uses_local_midnight() {
        // 2025-05-10 10:00 at UTC+8 == 02:00 UTC
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2025, 5, 10, 10, 0, 0).unwrap();
        let midnight = tz.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap().to_utc();

        let records = vec![
            rec(1, midnight),
            rec(10, midnight - Duration::seconds(1)),
            rec(100, midnight - Duration::hours(24)),
            // two days ago
            rec(1000, midnight - Duration::hours(24) - Duration::seconds(1)),
        ];
        let far = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let stats = aggregate_at(&records, far, far, now);
        assert_eq!(stats.last_day_usage, 110);
        assert_eq!(stats.weekly_usage, 1111);
        assert_eq!(stats.plan_total_usage, 0);
    }

    #[test]
    fn weekly_window_is_inclusive_at_both_ends() {
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();
        let records = vec![
            rec(1, now),
            rec(2, now - Duration::days(7)),
            rec(4, now - Duration::days(7) - Duration::seconds(1)),
        ];
        let stats = aggregate_at(&records, now, now, now);
        assert_eq!(stats.weekly_usage, 3);
        assert_eq!(stats.plan_total_usage, 1);
    }

    #[test]
    fn plan_total_matches_inclusive_filter() {
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let records: Vec<BillingRecord> = (0..50)
            .map(|i| rec(i * 3 + 1, start - Duration::days(5) + Duration::days(i as i64)))
            .chain([rec(7, start), rec(9, end), rec(11, end + Duration::seconds(1))])
            .collect();
        let expected: u64 = records
            .iter()
            .filter(|r| {
                r.created_at_seconds >= start.timestamp() && r.created_at_seconds <= end.timestamp()
            })
            .map(|r| r.consumed_tokens)
            .sum();
        let stats = aggregate_at(&records, start, end, end);
        assert_eq!(stats.plan_total_usage, expected);
    }

    #[test]
    fn empty_records_yield_zero() {
        let now = Utc::now();
        assert_eq!(aggregate(&[], now, now), UsageStats::default());
    }

    #[test]
    fn plan_window_from_expiry_is_one_calendar_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let ends = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        let exp = ExpiryInfo::new(ends, now);
        let (start, end) = plan_window(Some(&exp), &[], now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());
        assert_eq!(end, ends);
    }

    #[test]
    fn plan_window_without_expiry_starts_at_oldest_record() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let oldest = now - Duration::days(40);
        let records = vec![rec(1, now - Duration::days(2)), rec(1, oldest)];
        assert_eq!(plan_window(None, &records, now), (oldest, now));
        assert_eq!(plan_window(None, &[], now), (now, now));
    }
}

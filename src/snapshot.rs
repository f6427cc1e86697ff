//! # Snapshot Module
//!
//! Turns a raw quota-status payload (plus optional subscription payload) into
//! a [`QuotaSnapshot`]. The provider reports the *remaining* request count in a
//! field named like a usage count; the snapshot carries the consumed amount.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{QuotaError, Result};
use crate::models::quota::used_percentage;
use crate::models::{ExpiryInfo, QuotaSnapshot, RemainingDuration};

#[derive(Debug, Deserialize)]
struct QuotaPayloadDto {
    #[serde(default)]
    model_remains: Option<Vec<ModelRemainDto>>,
}

#[derive(Debug, Deserialize)]
struct ModelRemainDto {
    #[serde(default)]
    model_name: String,
    /// Interval bounds, epoch milliseconds
    #[serde(default)]
    start_time: i64,
    #[serde(default)]
    end_time: i64,
    /// Milliseconds until the interval resets
    #[serde(default)]
    remains_time: i64,
    #[serde(default, alias = "total_count")]
    current_interval_total_count: i64,
    /// Despite the name, this is what is left, not what was used
    #[serde(default, alias = "remaining_count")]
    current_interval_usage_count: i64,
}

const END_TIME_KEYS: &[&str] = &["current_subscribe_end_time", "end_time", "expire_time"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse against the wall clock, using the first model entry
pub fn parse(quota_payload: &Value, subscription_payload: Option<&Value>) -> Result<QuotaSnapshot> {
    parse_for_model(quota_payload, subscription_payload, None, Utc::now())
}

/// Parse selecting the entry named `preferred_model` when present, else the first.
///
/// Fails with [`QuotaError::Data`] when the payload has no model entries.
/// Subscription problems never fail the parse; they only drop the expiry.
pub fn parse_for_model(
    quota_payload: &Value,
    subscription_payload: Option<&Value>,
    preferred_model: Option<&str>,
    now: DateTime<Utc>,
) -> Result<QuotaSnapshot> {
    let dto = QuotaPayloadDto::deserialize(quota_payload)?;
    let models = dto.model_remains.unwrap_or_default();
    let chosen = preferred_model
        .and_then(|want| {
            models
                .iter()
                .find(|m| m.model_name.eq_ignore_ascii_case(want))
        })
        .or_else(|| models.first())
        .ok_or_else(|| QuotaError::Data("quota payload has no model entries".into()))?;

    let total = chosen.current_interval_total_count;
    let remaining = chosen.current_interval_usage_count;
    let used = (total - remaining).max(0);

    Ok(QuotaSnapshot {
        model_name: chosen.model_name.clone(),
        window_start: DateTime::from_timestamp_millis(chosen.start_time).unwrap_or_default(),
        window_end: DateTime::from_timestamp_millis(chosen.end_time).unwrap_or_default(),
        remaining_count: remaining,
        total_count: total,
        used_count: used,
        used_percentage: used_percentage(used, total),
        remaining: RemainingDuration::from_millis(chosen.remains_time),
        expiry: subscription_payload
            .and_then(subscription_end_time)
            .map(|ends_at| ExpiryInfo::new(ends_at, now)),
    })
}

/// End of the current subscription, if the payload carries a well-formed one
pub fn subscription_end_time(payload: &Value) -> Option<DateTime<Utc>> {
    let current = payload
        .get("current_subscribe")
        .or_else(|| payload.get("data").and_then(|d| d.get("current_subscribe")))?;
    END_TIME_KEYS
        .iter()
        .find_map(|key| current.get(*key).and_then(parse_end_time))
}

fn parse_end_time(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => epoch_to_datetime(n.as_i64()?),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return epoch_to_datetime(n);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            let date = DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())?;
            end_of_local_day(date)
        }
        _ => None,
    }
}

fn epoch_to_datetime(n: i64) -> Option<DateTime<Utc>> {
    if n <= 0 {
        return None;
    }
    if n >= 1_000_000_000_000 {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

fn end_of_local_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59)?;
    Local
        .from_local_datetime(&date.and_time(last_second))
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "model_remains": [
                {
                    "model_name": "MiniMax-M2",
                    "start_time": 1_746_000_000_000_i64,
                    "end_time": 1_746_018_000_000_i64,
                    "remains_time": 7_500_000,
                    "current_interval_total_count": 1500,
                    "current_interval_usage_count": 1200
                },
                {
                    "model_name": "speech-02",
                    "current_interval_total_count": 10,
                    "current_interval_usage_count": 10
                }
            ],
            "base_resp": {"status_code": 0, "status_msg": "success"}
        })
    }

    #[test]
    fn remaining_count_becomes_used_count() {
        let snap = parse(&payload(), None).unwrap();
        assert_eq!(snap.model_name, "MiniMax-M2");
        assert_eq!(snap.total_count, 1500);
        assert_eq!(snap.remaining_count, 1200);
        assert_eq!(snap.used_count, 300);
        assert_eq!(snap.used_percentage, 20);
        assert_eq!(snap.remaining, RemainingDuration { hours: 2, minutes: 5 });
        assert_eq!(snap.window_start.timestamp_millis(), 1_746_000_000_000);
        assert!(snap.expiry.is_none());
    }

    #[test]
    fn preferred_model_is_selected_case_insensitively() {
        let now = Utc::now();
        let snap = parse_for_model(&payload(), None, Some("SPEECH-02"), now).unwrap();
        assert_eq!(snap.model_name, "speech-02");
        assert_eq!(snap.used_count, 0);

        let fallback = parse_for_model(&payload(), None, Some("nope"), now).unwrap();
        assert_eq!(fallback.model_name, "MiniMax-M2");
    }

    #[test]
    fn empty_or_missing_model_list_is_data_error() {
        for p in [json!({"model_remains": []}), json!({}), json!({"model_remains": null})] {
            assert!(matches!(parse(&p, None), Err(QuotaError::Data(_))));
        }
    }

    #[test]
    fn zero_total_is_zero_percent() {
        let p = json!({"model_remains": [{"model_name": "m", "current_interval_total_count": 0, "current_interval_usage_count": 0}]});
        assert_eq!(parse(&p, None).unwrap().used_percentage, 0);
    }

    #[test]
    fn expiry_parsed_from_subscription() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let sub = json!({"current_subscribe": {"current_subscribe_end_time": "2025-06-21T00:00:00Z"}});
        let snap = parse_for_model(&payload(), Some(&sub), None, now).unwrap();
        let expiry = snap.expiry.unwrap();
        assert_eq!(expiry.days_remaining, 20);
        assert_eq!(expiry.ends_at, Utc.with_ymd_and_hms(2025, 6, 21, 0, 0, 0).unwrap());
    }

    #[test]
    fn end_time_formats() {
        let ms = json!({"current_subscribe": {"end_time": 1_750_000_000_000_i64}});
        assert_eq!(subscription_end_time(&ms).unwrap().timestamp(), 1_750_000_000);

        let secs = json!({"data": {"current_subscribe": {"expire_time": "1750000000"}}});
        assert_eq!(subscription_end_time(&secs).unwrap().timestamp(), 1_750_000_000);

        let us_date = json!({"current_subscribe": {"current_subscribe_end_time": "07/15/2025"}});
        let local = subscription_end_time(&us_date).unwrap().with_timezone(&Local);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
    }

    #[test]
    fn malformed_subscription_drops_expiry_only() {
        for sub in [
            json!({}),
            json!({"current_subscribe": {"current_subscribe_end_time": "soon"}}),
            json!({"current_subscribe": {"current_subscribe_end_time": 0}}),
            json!("garbage"),
        ] {
            let snap = parse(&payload(), Some(&sub)).unwrap();
            assert!(snap.expiry.is_none());
        }
    }
}

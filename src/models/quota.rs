use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

/// Whole hours and minutes left in the current quota interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemainingDuration {
    pub hours: u64,
    pub minutes: u64,
}

impl RemainingDuration {
    pub fn from_millis(ms: i64) -> Self {
        let ms = ms.max(0) as u64;
        RemainingDuration {
            hours: ms / 3_600_000,
            minutes: (ms % 3_600_000) / 60_000,
        }
    }

    pub fn total_minutes(&self) -> u64 {
        self.hours * 60 + self.minutes
    }
}

/// Coarse subscription state. `as_str` is a raw tag; wording is left to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Active,
    ExpiringSoon,
    Expired,
}

impl ExpiryStatus {
    /// Days remaining at or below which a subscription counts as expiring
    pub const EXPIRING_SOON_DAYS: i64 = 7;

    pub fn from_days_remaining(days: i64) -> Self {
        if days < 0 {
            Self::Expired
        } else if days <= Self::EXPIRING_SOON_DAYS {
            Self::ExpiringSoon
        } else {
            Self::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryInfo {
    /// Instant the subscription ends
    pub ends_at: DateTime<Utc>,
    /// Local calendar date of `ends_at`
    pub date: NaiveDate,
    pub days_remaining: i64,
    pub status: ExpiryStatus,
}

impl ExpiryInfo {
    pub fn new(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let secs = (ends_at - now).num_seconds();
        // Partial days count as a full day left
        let days_remaining = if secs >= 0 {
            (secs + 86_399) / 86_400
        } else {
            -((-secs + 86_399) / 86_400)
        };
        ExpiryInfo {
            ends_at,
            date: ends_at.with_timezone(&Local).date_naive(),
            days_remaining,
            status: ExpiryStatus::from_days_remaining(days_remaining),
        }
    }
}

/// Normalized view of the current quota interval for one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaSnapshot {
    pub model_name: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub remaining_count: i64,
    pub total_count: i64,
    pub used_count: i64,
    pub used_percentage: u8,
    pub remaining: RemainingDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<ExpiryInfo>,
}

/// `round(used / total * 100)` clamped to 0..=100; a zero total yields 0
pub fn used_percentage(used: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let pct = ((used as f64 / total as f64) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

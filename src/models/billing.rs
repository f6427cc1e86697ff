use serde::Serialize;

/// One metered consumption event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingRecord {
    pub consumed_tokens: u64,
    /// Unix seconds
    pub created_at_seconds: i64,
}

impl BillingRecord {
    pub fn created_at_millis(&self) -> i64 {
        self.created_at_seconds.saturating_mul(1000)
    }
}

/// Records collected by the paginator, possibly cut short by a failed page
#[derive(Debug, Clone, Default)]
pub struct BillingHistory {
    pub records: Vec<BillingRecord>,
    pub pages_fetched: u32,
    /// A page request failed before the history was exhausted
    pub partial: bool,
}

/// Token consumption over the three reporting windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub last_day_usage: u64,
    pub weekly_usage: u64,
    pub plan_total_usage: u64,
}

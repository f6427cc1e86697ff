//! # Engine Module
//!
//! One refresh cycle: quota + subscription (concurrently), snapshot parse,
//! billing history (through its own cache), window aggregation, then the
//! optional transcript and secondary-account lookups. Only the primary quota
//! path can fail the cycle; everything else degrades to `None` or a partial
//! flag.

use chrono::{DateTime, Duration, Local, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use crate::api::{HttpClient, fetch_quota_payload, fetch_subscription};
use crate::billing::{BillingPaginator, DEFAULT_MAX_PAGES};
use crate::cache::{BILLING_TTL_SECONDS, Clock, QUOTA_TTL_SECONDS, SystemClock, TtlCache};
use crate::error::{BestEffort, Result};
use crate::models::{BillingHistory, QuotaSnapshot, UsageStats};
use crate::snapshot;
use crate::stats;
use crate::tokens::TokenUsageFigures;
use crate::transcript::resolve_transcript_usage;

/// Everything one refresh produced, ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub primary: QuotaSnapshot,
    pub usage: UsageStats,
    pub secondary: Option<QuotaSnapshot>,
    pub context: Option<TokenUsageFigures>,
    /// Billing history stopped early on a failed page
    pub billing_partial: bool,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_pages: u32,
    pub preferred_model: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            preferred_model: None,
        }
    }
}

pub struct UsageEngine {
    primary: Arc<dyn HttpClient>,
    secondary: Option<Arc<dyn HttpClient>>,
    quota_cache: TtlCache<Value>,
    billing_cache: TtlCache<BillingHistory>,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
}

impl UsageEngine {
    pub fn new(
        primary: Arc<dyn HttpClient>,
        secondary: Option<Arc<dyn HttpClient>>,
        options: EngineOptions,
    ) -> Self {
        Self::with_clock(primary, secondary, options, Arc::new(SystemClock))
    }

    /// Build with an explicit time source (cache expiry and window anchors)
    pub fn with_clock(
        primary: Arc<dyn HttpClient>,
        secondary: Option<Arc<dyn HttpClient>>,
        options: EngineOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            primary,
            secondary,
            quota_cache: TtlCache::new(Duration::seconds(QUOTA_TTL_SECONDS), Arc::clone(&clock)),
            billing_cache: TtlCache::new(
                Duration::seconds(BILLING_TTL_SECONDS),
                Arc::clone(&clock),
            ),
            clock,
            options,
        }
    }

    /// Run one refresh cycle. `transcript` is only supplied by the status-line
    /// integration; without it `context` stays `None`.
    pub fn refresh(&self, transcript: Option<&Path>) -> Result<StatusPayload> {
        let primary_client = self.primary.as_ref();
        let (quota, subscription) = thread::scope(|s| {
            let subscription = s.spawn(|| fetch_subscription(primary_client));
            let quota = self.quota_payload();
            let subscription = subscription
                .join()
                .unwrap_or_else(|_| BestEffort::Miss("subscription lookup panicked".into()));
            (quota, subscription)
        });
        let quota = quota?;
        let subscription = subscription.into_option();

        let now = self.clock.now();
        let primary = snapshot::parse_for_model(
            &quota,
            subscription.as_ref(),
            self.options.preferred_model.as_deref(),
            now,
        )?;

        let history = self.billing_history();
        let (plan_start, plan_end) = stats::plan_window(primary.expiry.as_ref(), &history.records, now);
        let usage = stats::aggregate_at(
            &history.records,
            plan_start,
            plan_end,
            now.with_timezone(&Local),
        );

        let context = transcript.and_then(resolve_transcript_usage);
        let secondary = self
            .secondary
            .as_deref()
            .and_then(|client| self.secondary_snapshot(client, now));

        Ok(StatusPayload {
            primary,
            usage,
            secondary,
            context,
            billing_partial: history.partial,
            generated_at: now,
        })
    }

    fn quota_payload(&self) -> Result<Arc<Value>> {
        let key = self.primary.account_key();
        if let Some(hit) = self.quota_cache.get(key) {
            tracing::debug!(key, "quota cache hit");
            return Ok(hit);
        }
        let payload = fetch_quota_payload(self.primary.as_ref())?;
        Ok(self.quota_cache.put(key, payload))
    }

    fn billing_history(&self) -> Arc<BillingHistory> {
        let key = self.primary.account_key();
        if let Some(hit) = self.billing_cache.get(key) {
            tracing::debug!(key, records = hit.records.len(), "billing cache hit");
            return hit;
        }
        let history = BillingPaginator::new(self.primary.as_ref()).fetch_all(self.options.max_pages);
        if history.pages_fetched == 0 {
            // Nothing came back; retry on the next cycle instead of caching emptiness
            return Arc::new(history);
        }
        self.billing_cache.put(key, history)
    }

    fn secondary_snapshot(&self, client: &dyn HttpClient, now: DateTime<Utc>) -> Option<QuotaSnapshot> {
        let result = fetch_quota_payload(client).and_then(|quota| {
            let subscription = fetch_subscription(client).into_option();
            snapshot::parse_for_model(
                &quota,
                subscription.as_ref(),
                self.options.preferred_model.as_deref(),
                now,
            )
        });
        match result {
            Ok(snap) => Some(snap),
            Err(err) => {
                tracing::warn!(account = client.account_key(), %err, "secondary account refresh failed");
                None
            }
        }
    }
}

//! # Billing Module
//!
//! Walks the paged billing-history endpoint. Pages are requested strictly in
//! order because each page's size decides whether another request is needed.

use serde_json::Value;

use crate::api::{BILLING_PATH, HttpClient, check_base_resp};
use crate::error::Result;
use crate::models::{BillingHistory, BillingRecord};

/// Records requested per page
pub const PAGE_SIZE: usize = 100;

/// Default bound on round trips (up to 1000 records)
pub const DEFAULT_MAX_PAGES: u32 = 10;

pub struct BillingPaginator<'a> {
    client: &'a dyn HttpClient,
}

impl<'a> BillingPaginator<'a> {
    pub fn new(client: &'a dyn HttpClient) -> Self {
        Self { client }
    }

    /// Collect records from page 1 onward.
    ///
    /// Stops on an empty page, on a short page (fewer than [`PAGE_SIZE`]
    /// entries means it was the last one), after `max_pages` requests, or on
    /// the first failed request. A failure keeps what was already collected
    /// and marks the history partial.
    pub fn fetch_all(&self, max_pages: u32) -> BillingHistory {
        let mut history = BillingHistory::default();
        for page in 1..=max_pages {
            let (raw_len, mut records) = match self.fetch_page(page) {
                Ok(r) => r,
                Err(err) => {
                    tracing::warn!(page, %err, collected = history.records.len(), "billing page failed");
                    history.partial = true;
                    break;
                }
            };
            history.pages_fetched = page;
            history.records.append(&mut records);
            if raw_len < PAGE_SIZE {
                break;
            }
        }
        tracing::debug!(
            pages = history.pages_fetched,
            records = history.records.len(),
            partial = history.partial,
            "billing history fetched"
        );
        history
    }

    /// One page: (number of entries the server returned, parsed records)
    fn fetch_page(&self, page: u32) -> Result<(usize, Vec<BillingRecord>)> {
        let query = [
            ("page", page.to_string()),
            ("limit", PAGE_SIZE.to_string()),
            ("aggregate", "false".to_string()),
        ];
        let payload = self.client.get_json(BILLING_PATH, &query)?;
        check_base_resp(&payload)?;
        Ok(parse_records(&payload))
    }
}

/// Parse `charge_records`. Entries without a usable token count or timestamp
/// are skipped but still counted toward the page size.
pub fn parse_records(payload: &Value) -> (usize, Vec<BillingRecord>) {
    let Some(items) = payload.get("charge_records").and_then(Value::as_array) else {
        return (0, Vec::new());
    };
    let records = items
        .iter()
        .filter_map(|item| {
            let consumed_tokens = number_field(item.get("consume_token")?)?;
            let created = i64::try_from(number_field(item.get("created_at")?)?).ok()?;
            Some(BillingRecord {
                consumed_tokens,
                created_at_seconds: normalize_epoch_seconds(created),
            })
        })
        .collect();
    (items.len(), records)
}

fn number_field(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        }),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(|f| {
            if f.is_finite() && f >= 0.0 {
                Some(f.round() as u64)
            } else {
                None
            }
        }),
        _ => None,
    }
}

// Values of 1e12 and above are milliseconds
fn normalize_epoch_seconds(n: i64) -> i64 {
    if n >= 1_000_000_000_000 { n / 1000 } else { n }
}

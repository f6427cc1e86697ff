#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use std::sync::Mutex;

use plan_statusline::api::{BILLING_PATH, HttpClient, QUOTA_PATH, SUBSCRIPTION_PATH};
use plan_statusline::cache::Clock;
use plan_statusline::error::Result;

type Handler = Box<dyn Fn(&str, &[(&str, String)]) -> Result<Value> + Send + Sync>;

/// `HttpClient` answering from a closure and recording every request
pub struct ScriptedClient {
    key: String,
    handler: Handler,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedClient {
    pub fn new(
        key: &str,
        handler: impl Fn(&str, &[(&str, String)]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.to_string(),
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    pub fn quota_calls(&self) -> usize {
        self.calls_to(QUOTA_PATH)
    }

    pub fn billing_calls(&self) -> usize {
        self.calls_to(BILLING_PATH)
    }

    pub fn subscription_calls(&self) -> usize {
        self.calls_to(SUBSCRIPTION_PATH)
    }

    /// Page numbers requested from the billing endpoint, in order
    pub fn pages_requested(&self) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == BILLING_PATH)
            .filter_map(|(_, q)| query_value(q, "page"))
            .filter_map(|v| v.parse().ok())
            .collect()
    }
}

impl HttpClient for ScriptedClient {
    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.calls.lock().unwrap().push((
            path.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));
        (self.handler)(path, query)
    }

    fn account_key(&self) -> &str {
        &self.key
    }
}

fn query_value(query: &[(String, String)], key: &str) -> Option<String> {
    query.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

pub fn page_of(query: &[(&str, String)]) -> u32 {
    query
        .iter()
        .find(|(k, _)| *k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0)
}

pub fn quota_body(total: i64, remaining: i64) -> Value {
    json!({
        "model_remains": [{
            "model_name": "MiniMax-M2",
            "start_time": 1_746_000_000_000_i64,
            "end_time": 1_746_018_000_000_i64,
            "remains_time": 3_600_000,
            "current_interval_total_count": total,
            "current_interval_usage_count": remaining
        }],
        "base_resp": {"status_code": 0, "status_msg": "success"}
    })
}

pub fn subscription_body(ends_at: DateTime<Utc>) -> Value {
    json!({
        "current_subscribe": {"current_subscribe_end_time": ends_at.to_rfc3339()},
        "base_resp": {"status_code": 0, "status_msg": "success"}
    })
}

/// A billing page of `count` records, each worth `tokens`, created at `at`
pub fn billing_page(count: usize, tokens: u64, at: DateTime<Utc>) -> Value {
    let records: Vec<Value> = (0..count)
        .map(|_| json!({"consume_token": tokens, "created_at": at.timestamp()}))
        .collect();
    json!({"charge_records": records, "base_resp": {"status_code": 0}})
}

/// Clock that only moves when told to
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

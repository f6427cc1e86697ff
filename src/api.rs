//! # API Module
//!
//! HTTP access to the provider's quota, subscription and billing endpoints.
//! The rest of the crate talks to [`HttpClient`] so tests can script responses;
//! [`UreqClient`] is the production implementation.

use serde_json::Value;
use std::time::Duration;

use crate::error::{BestEffort, QuotaError, Result};

/// Default endpoint for the primary account
pub const DEFAULT_BASE_URL: &str = "https://www.minimaxi.com";
/// Default endpoint for the secondary (international) account
pub const DEFAULT_SECONDARY_BASE_URL: &str = "https://api.minimax.io";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const QUOTA_PATH: &str = "/v1/api/openplatform/coding_plan/remains";
pub const SUBSCRIPTION_PATH: &str = "/v1/api/openplatform/charge/combo/cycle_audio_resource_package";
pub const BILLING_PATH: &str = "/account/amount";

/// `base_resp.status_code` values meaning the token or group id was rejected
const AUTH_STATUS_CODES: &[i64] = &[1004, 2049];

const USER_AGENT: &str = concat!("plan-statusline/", env!("CARGO_PKG_VERSION"));

/// Single-attempt JSON GET. No retries; the caller's refresh cycle is the retry.
pub trait HttpClient: Send + Sync {
    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value>;

    /// Stable identifier of the account this client talks for, used as cache key
    fn account_key(&self) -> &str;
}

/// Blocking client over a shared `ureq::Agent` (connection reuse).
pub struct UreqClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    group_id: String,
}

impl UreqClient {
    pub fn new(base_url: &str, token: &str, group_id: &str, timeout_ms: u64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(timeout_ms)))
            .http_status_as_error(false)
            .build()
            .into();
        UreqClient {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            group_id: group_id.trim().to_string(),
        }
    }
}

impl HttpClient for UreqClient {
    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .query("GroupId", &self.group_id);
        for (key, value) in query {
            request = request.query(*key, value);
        }

        let mut response = request
            .call()
            .map_err(|e| QuotaError::Transport(format!("GET {path}: {e}")))?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {}
            401 | 403 => return Err(QuotaError::Auth(format!("GET {path}: HTTP {status}"))),
            _ => return Err(QuotaError::Transport(format!("GET {path}: HTTP {status}"))),
        }

        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|e| QuotaError::Data(format!("GET {path}: undecodable body: {e}")))
    }

    fn account_key(&self) -> &str {
        &self.group_id
    }
}

/// Provider-level status block carried by every response
pub(crate) fn check_base_resp(payload: &Value) -> Result<()> {
    let Some(base) = payload.get("base_resp") else {
        return Ok(());
    };
    let code = base.get("status_code").and_then(Value::as_i64).unwrap_or(0);
    if code == 0 {
        return Ok(());
    }
    let msg = base
        .get("status_msg")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let detail = format!("provider status {code}: {msg}");
    if AUTH_STATUS_CODES.contains(&code) {
        Err(QuotaError::Auth(detail))
    } else {
        Err(QuotaError::Data(detail))
    }
}

/// Raw quota-status payload
pub fn fetch_quota_payload(client: &dyn HttpClient) -> Result<Value> {
    let payload = client.get_json(QUOTA_PATH, &[])?;
    check_base_resp(&payload)?;
    Ok(payload)
}

/// Subscription metadata; any failure is logged and reported as a miss
pub fn fetch_subscription(client: &dyn HttpClient) -> BestEffort<Value> {
    let query = [
        ("biz_line", "2".to_string()),
        ("cycle_type", "1".to_string()),
        ("resource_package_type", "7".to_string()),
    ];
    let result = client
        .get_json(SUBSCRIPTION_PATH, &query)
        .and_then(|payload| check_base_resp(&payload).map(|_| payload));
    if let Err(ref err) = result {
        tracing::warn!(%err, "subscription lookup failed");
    }
    result.into()
}

//! Token figure resolution for usage objects from several vendor formats.
//!
//! Each logical figure is read from an ordered list of source paths; the first
//! source holding a non-zero number wins and an all-absent figure is 0.

use serde::Serialize;
use serde_json::Value;

/// Path of nested keys inside a usage object
type SourcePath = &'static [&'static str];

const INPUT_SOURCES: &[SourcePath] = &[&["input_tokens"], &["prompt_tokens"]];
const OUTPUT_SOURCES: &[SourcePath] = &[&["output_tokens"], &["completion_tokens"]];
const CACHE_CREATION_SOURCES: &[SourcePath] =
    &[&["cache_creation_input_tokens"], &["cache_creation_tokens"]];
const CACHE_READ_SOURCES: &[SourcePath] = &[
    &["cache_read_input_tokens"],
    &["cached_tokens"],
    &["prompt_tokens_details", "cached_tokens"],
];
const TOTAL_SOURCES: &[SourcePath] = &[&["total_tokens"]];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsageFigures {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    /// Vendor-reported combined figure, used only when the parts sum to zero
    pub total_tokens: u64,
}

impl TokenUsageFigures {
    pub fn from_usage(usage: &Value) -> Self {
        TokenUsageFigures {
            input_tokens: resolve_field(usage, INPUT_SOURCES),
            output_tokens: resolve_field(usage, OUTPUT_SOURCES),
            cache_creation_tokens: resolve_field(usage, CACHE_CREATION_SOURCES),
            cache_read_tokens: resolve_field(usage, CACHE_READ_SOURCES),
            total_tokens: resolve_field(usage, TOTAL_SOURCES),
        }
    }

    /// Tokens occupying the context window
    pub fn context_tokens(&self) -> u64 {
        let sum = self
            .input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_tokens)
            .saturating_add(self.cache_read_tokens);
        if sum > 0 { sum } else { self.total_tokens }
    }

    /// Share of `limit` in use, 0..=100
    pub fn context_percent(&self, limit: u64) -> u8 {
        let used = self.context_tokens();
        if limit == 0 {
            return if used == 0 { 0 } else { 100 };
        }
        let pct = ((used as f64 / limit as f64) * 100.0).round();
        pct.min(100.0) as u8
    }
}

/// First non-zero value among `sources`, else 0
pub fn resolve_field(usage: &Value, sources: &[SourcePath]) -> u64 {
    sources
        .iter()
        .filter_map(|path| lookup(usage, path))
        .find(|n| *n > 0)
        .unwrap_or(0)
}

fn lookup(usage: &Value, path: &[&str]) -> Option<u64> {
    let mut cur = usage;
    for key in path {
        cur = cur.get(*key)?;
    }
    as_token_count(cur)
}

fn as_token_count(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

use serde_json::{Value, json};

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bright_black(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_white(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::engine::StatusPayload;
use crate::models::{ExpiryInfo, ExpiryStatus, QuotaSnapshot};
use crate::tokens::TokenUsageFigures;
use crate::utils::{NumberLocale, format_count, format_path, format_percent, format_remaining};

/// Below this many columns the status line drops its secondary segments
pub const COMPACT_WIDTH: u16 = 80;

/// Default context window when the host does not say otherwise
pub const DEFAULT_CONTEXT_LIMIT: u64 = 200_000;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub locale: NumberLocale,
    pub context_limit: u64,
    pub color: bool,
    /// Terminal width; `None` renders the full layout
    pub width: Option<u16>,
    /// Working directory shown as the trailing segment (status-line mode)
    pub cwd: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            locale: NumberLocale::En,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            color: true,
            width: None,
            cwd: None,
        }
    }
}

impl RenderOptions {
    fn compact(&self) -> bool {
        self.width.is_some_and(|w| w < COMPACT_WIDTH)
    }
}

/// Current terminal width, if stdout is a terminal
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w)
}

const SEP: &str = " │ ";

fn colorize_percent(pct: u8, color: bool) -> String {
    let text = format_percent(pct);
    if !color {
        text
    } else if pct >= 95 {
        text.red().bold().to_string()
    } else if pct >= 80 {
        text.yellow().bold().to_string()
    } else {
        text.green().to_string()
    }
}

fn dim(text: &str, color: bool) -> String {
    if color {
        text.bright_black().to_string()
    } else {
        text.to_string()
    }
}

fn expiry_segment(expiry: &ExpiryInfo, color: bool) -> String {
    let text = format!("exp {} ({}d)", expiry.date.format("%Y-%m-%d"), expiry.days_remaining);
    if !color {
        return text;
    }
    match expiry.status {
        ExpiryStatus::Expired => text.red().bold().to_string(),
        ExpiryStatus::ExpiringSoon => text.yellow().to_string(),
        ExpiryStatus::Active => text.dimmed().to_string(),
    }
}

fn quota_segment(snap: &QuotaSnapshot, opts: &RenderOptions) -> String {
    let name = if opts.color {
        snap.model_name.bright_cyan().to_string()
    } else {
        snap.model_name.clone()
    };
    let pct = colorize_percent(snap.used_percentage, opts.color);
    if opts.compact() {
        return format!("{name} {pct} ⟳{}", format_remaining(snap.remaining));
    }
    format!(
        "{name} {}/{} {pct} {}",
        snap.used_count,
        snap.total_count,
        dim(&format!("⟳ {}", format_remaining(snap.remaining)), opts.color)
    )
}

fn context_segment(ctx: &TokenUsageFigures, opts: &RenderOptions) -> String {
    let pct = colorize_percent(ctx.context_percent(opts.context_limit), opts.color);
    if opts.compact() {
        return format!("ctx {pct}");
    }
    format!("ctx {} {pct}", format_count(ctx.context_tokens(), opts.locale))
}

fn usage_segment(payload: &StatusPayload, opts: &RenderOptions) -> String {
    let u = &payload.usage;
    let mark = if payload.billing_partial { "*" } else { "" };
    format!(
        "1d {} · 7d {} · plan {}{mark}",
        format_count(u.last_day_usage, opts.locale),
        format_count(u.weekly_usage, opts.locale),
        format_count(u.plan_total_usage, opts.locale),
    )
}

/// One-line text rendering of a refresh result
pub fn render_text(payload: &StatusPayload, opts: &RenderOptions) -> String {
    let mut parts: Vec<String> = vec![quota_segment(&payload.primary, opts)];
    if let Some(ctx) = payload.context.as_ref() {
        parts.push(context_segment(ctx, opts));
    }
    if opts.compact() {
        if let Some(sec) = payload.secondary.as_ref() {
            parts.push(format!("alt {}", colorize_percent(sec.used_percentage, opts.color)));
        }
        return parts.join(" ");
    }

    parts.push(usage_segment(payload, opts));
    if let Some(expiry) = payload.primary.expiry.as_ref() {
        parts.push(expiry_segment(expiry, opts.color));
    }
    if let Some(sec) = payload.secondary.as_ref() {
        parts.push(format!(
            "alt {} {}",
            sec.model_name,
            colorize_percent(sec.used_percentage, opts.color)
        ));
    }
    if let Some(cwd) = opts.cwd.as_deref() {
        parts.push(dim(&format_path(cwd), opts.color));
    }
    parts.join(SEP)
}

/// Status line shown when the primary refresh failed
pub fn render_error(message: &str, color: bool) -> String {
    if color {
        format!("{} {}", "⚠".yellow(), message.dimmed())
    } else {
        format!("⚠ {message}")
    }
}

fn quota_json(snap: &QuotaSnapshot) -> Value {
    json!({
        "model_name": snap.model_name,
        "used": snap.used_count,
        "remaining": snap.remaining_count,
        "total": snap.total_count,
        "used_percent": snap.used_percentage,
        "window_start": snap.window_start.to_rfc3339(),
        "window_end": snap.window_end.to_rfc3339(),
        "resets_in_minutes": snap.remaining.total_minutes(),
        "expiry": snap.expiry.as_ref().map(|e| json!({
            "ends_at": e.ends_at.to_rfc3339(),
            "date": e.date.format("%Y-%m-%d").to_string(),
            "days_remaining": e.days_remaining,
            "status": e.status.as_str(),
        })),
    })
}

/// Machine-readable rendering with a stable top-level schema
pub fn build_json_output(payload: &StatusPayload) -> Value {
    json!({
        "quota": quota_json(&payload.primary),
        "usage": {
            "last_day": payload.usage.last_day_usage,
            "weekly": payload.usage.weekly_usage,
            "plan_total": payload.usage.plan_total_usage,
            "partial": payload.billing_partial,
        },
        "context": payload.context.as_ref().map(|c| json!({
            "input_tokens": c.input_tokens,
            "output_tokens": c.output_tokens,
            "cache_creation_tokens": c.cache_creation_tokens,
            "cache_read_tokens": c.cache_read_tokens,
            "context_tokens": c.context_tokens(),
        })),
        "secondary": payload.secondary.as_ref().map(quota_json),
        "generated_at": payload.generated_at.to_rfc3339(),
    })
}

pub fn print_json_output(payload: &StatusPayload) -> anyhow::Result<()> {
    let json = build_json_output(payload);
    println!("{}", serde_json::to_string(&json)?);
    Ok(())
}

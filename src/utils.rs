use std::io::Read;

use crate::models::RemainingDuration;

/// Magnitude-suffix convention for large counts
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberLocale {
    /// K / M / B (thousands)
    #[default]
    En,
    /// 万 / 亿 (ten-thousands)
    Zh,
}

pub fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn format_path(p: &str) -> String {
    if let Some(b) = directories::BaseDirs::new() {
        let home_s = b.home_dir().to_string_lossy();
        if p.starts_with(&*home_s) {
            return format!("~{}", &p[home_s.len()..]);
        }
    }
    p.to_owned()
}

const EN_UNITS: &[(f64, &str)] = &[(1e9, "B"), (1e6, "M"), (1e3, "K")];
const ZH_UNITS: &[(f64, &str)] = &[(1e8, "亿"), (1e4, "万")];

pub fn format_count(n: u64, locale: NumberLocale) -> String {
    let (units, step) = match locale {
        NumberLocale::En => (EN_UNITS, 1e3),
        NumberLocale::Zh => (ZH_UNITS, 1e4),
    };
    let v = n as f64;
    // Units run largest first; a value that rounds up to `step` moves one unit up
    for (i, &(scale, suffix)) in units.iter().enumerate() {
        let scaled = v / scale;
        if scaled < 1.0 {
            continue;
        }
        if i > 0 && (scaled * 10.0).round() / 10.0 >= step {
            let (up_scale, up_suffix) = units[i - 1];
            return format!("{:.1}{up_suffix}", v / up_scale);
        }
        return format!("{scaled:.1}{suffix}");
    }
    n.to_string()
}

/// `2h 05m`, or just `45m` under an hour
pub fn format_remaining(d: RemainingDuration) -> String {
    if d.hours > 0 {
        format!("{}h {:02}m", d.hours, d.minutes)
    } else {
        format!("{}m", d.minutes)
    }
}

pub fn format_percent(pct: u8) -> String {
    format!("{}%", pct.min(100))
}

//! Duration strings used by the CLI and config files.

use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to seconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 0.001),
    ("s", 1.0),
    ("m", 60.0),
    ("h", 3_600.0),
];

/// Parse duration strings like "500ms", "2.5s", "10m", "1h".
///
/// A bare number is taken as seconds, which matches the integer
/// `--poll-interval` values older scripts pass.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<f64>() {
        return to_duration(secs, s);
    }

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            return to_duration(val * multiplier, s);
        }
    }

    bail!("Unknown duration format: {}", s)
}

fn to_duration(secs: f64, raw: &str) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("Duration must be a non-negative number: {}", raw);
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => Ok(d),
        Err(_) => bail!("Duration is too large: {}", raw),
    }
}

/// Format elapsed seconds the way the summary table prints them.
pub fn format_secs(secs: f64) -> String {
    format!("{:.2}", secs)
}

/// Format a duration for log lines and the run banner.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if d.as_secs() < 60 || d.subsec_millis() != 0 {
        format!("{:.2}s", d.as_secs_f64())
    } else if d.as_secs() % 3_600 == 0 {
        format!("{}h", d.as_secs() / 3_600)
    } else if d.as_secs() % 60 == 0 {
        format!("{}m", d.as_secs() / 60)
    } else {
        format!("{}s", d.as_secs())
    }
}

//! # Stat parsing
//! Raw fighter stats arrive as CSV tokens. A token that does not parse is
//! never an error: callers pick the default that fits the field.

/// Parse a numeric stat token. Empty, malformed and non-finite tokens → `None`.
pub fn parse_stat(token: &str) -> Option<f64> {
    let t = token.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a stat token, substituting `default` when it is unusable.
#[inline]
pub fn stat_or(token: &str, default: f64) -> f64 {
    parse_stat(token).unwrap_or(default)
}

/// Same as [`stat_or`] for optional tokens (missing column / field).
#[inline]
pub fn opt_stat_or(token: Option<&str>, default: f64) -> f64 {
    token.and_then(parse_stat).unwrap_or(default)
}

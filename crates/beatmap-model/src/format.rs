// Locale-independent number formatting for beatmap text lines.
//
// Rust's `f64` parsing and `Display` never consult the host locale, so these
// helpers only pin down trimming, integer rounding and negative zero.

pub(crate) fn parse_f64(token: &str) -> Option<f64> {
    token.trim().parse().ok()
}

pub(crate) fn parse_i32(token: &str) -> Option<i32> {
    token.trim().parse().ok()
}

/// Shortest representation that parses back to the same value.
pub(crate) fn format_f64(value: f64) -> String {
    // -0.0 would print as "-0"
    format!("{}", value + 0.0)
}

/// Rounds half to even before printing, so 0.5 -> "0" and 1.5 -> "2".
pub(crate) fn format_rounded(value: f64) -> String {
    format_f64(value.round_ties_even())
}

//! Shutdown delay parsing.
//!
//! Accepts `now`, a bare number of seconds, or a number suffixed with
//! `s`, `m` or `h`. Anything else (signs, whitespace, fractions, unknown
//! suffixes, overflow) is rejected.

/// Parses a shutdown delay into whole seconds.
///
/// `"30s"` → 30, `"5m"` → 300, `"2h"` → 7200, `"now"` → 0, `"15"` → 15.
#[must_use]
pub fn parse_duration(input: &str) -> Option<u64> {
    if input == "now" {
        return Some(0);
    }

    let (digits, multiplier) = match input.as_bytes().last()? {
        b's' => (&input[..input.len() - 1], 1),
        b'm' => (&input[..input.len() - 1], 60),
        b'h' => (&input[..input.len() - 1], 3600),
        _ => (input, 1),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

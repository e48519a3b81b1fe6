//! Time text codec: "hh:mm:ss" / "mm:ss" / "ss" ↔ whole seconds.

/// Format whole seconds as zero-padded `HH:MM:SS`.
///
/// Minutes and seconds are always two digits; hours grow past two digits
/// unpadded ("123:00:00"). Truncation only, no rounding.
pub fn format_time(seconds: u64) -> String {
  let h = seconds / 3600;
  let m = (seconds % 3600) / 60;
  let s = seconds % 60;
  format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Parse "hh:mm:ss", "mm:ss" or "ss" into whole seconds.
///
/// Any other field count, or a non-numeric fragment, yields 0. The silent
/// fallback is the contract: a half-typed field reads as an empty clip and
/// disables the loop instead of erroring mid-edit. Exact inverse of
/// [`format_time`] for values up to 99:59:59.
pub fn parse_time(text: &str) -> u64 {
  let parsed: Option<Vec<u64>> = text.split(':').map(|f| f.trim().parse::<u64>().ok()).collect();
  match parsed.as_deref() {
    Some([h, m, s]) => h * 3600 + m * 60 + s,
    Some([m, s]) => m * 60 + s,
    Some([s]) => *s,
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- format_time ---

  #[test]
  fn format_pads_every_field() {
    assert_eq!(format_time(0), "00:00:00");
    assert_eq!(format_time(7), "00:00:07");
    assert_eq!(format_time(65), "00:01:05");
    assert_eq!(format_time(3600), "01:00:00");
    assert_eq!(format_time(3723), "01:02:03");
  }

  #[test]
  fn format_hours_grow_unpadded() {
    assert_eq!(format_time(359999), "99:59:59");
    assert_eq!(format_time(360000), "100:00:00");
  }

  // --- parse_time ---

  #[test]
  fn parse_three_fields() {
    assert_eq!(parse_time("01:02:03"), 3723);
    assert_eq!(parse_time("1:2:3"), 3723);
  }

  #[test]
  fn parse_two_fields() {
    assert_eq!(parse_time("02:05"), 125);
    assert_eq!(parse_time("90:00"), 5400); // minutes are not range-checked
  }

  #[test]
  fn parse_one_field() {
    assert_eq!(parse_time("42"), 42);
    assert_eq!(parse_time("0"), 0);
  }

  #[test]
  fn parse_malformed_yields_zero() {
    assert_eq!(parse_time(""), 0);
    assert_eq!(parse_time("abc"), 0);
    assert_eq!(parse_time("1:2:3:4"), 0);
    assert_eq!(parse_time("1:xx"), 0);
    assert_eq!(parse_time(":"), 0);
    assert_eq!(parse_time("-5"), 0);
  }

  #[test]
  fn round_trip_full_range() {
    for s in 0..=359_999u64 {
      assert_eq!(parse_time(&format_time(s)), s);
    }
  }
}

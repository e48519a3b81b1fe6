use serde::{Deserialize, Serialize};

use crate::timecode::parse_time;

/// A clip selection for one video: the `[start, end)` range in whole seconds,
/// how many times to play it, and whether to repeat forever.
///
/// `start >= end` is a degenerate clip: accepted everywhere, looped nowhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSettings {
  pub start: u64,
  pub end: u64,
  pub count: u32,
  pub infinite: bool,
}

impl ClipSettings {
  /// Defaults for a video with no persisted record: the whole video, once.
  /// `end` stays 0 until the player reports a duration.
  pub fn defaults(duration: Option<f64>) -> Self {
    Self { start: 0, end: duration.map_or(0, |d| d as u64), count: 1, infinite: false }
  }

  /// The commit boundary: build settings from live field text.
  ///
  /// Time fields follow the [`parse_time`] contract (malformed → 0). A
  /// non-numeric or non-positive count is coerced to 1 here, never inside
  /// loop evaluation.
  pub fn from_fields(start: &str, end: &str, count: &str, infinite: bool) -> Self {
    let count = count.trim().parse::<u32>().ok().filter(|c| *c > 0).unwrap_or(1);
    Self { start: parse_time(start), end: parse_time(end), count, infinite }
  }

  /// Whether the range can rewind at all.
  pub fn is_loopable(&self) -> bool {
    self.start < self.end
  }
}

//! Video identifier handling for watch URLs.

/// Length of a canonical YouTube video id.
const VIDEO_ID_LEN: usize = 11;

fn looks_like_id(s: &str) -> bool {
  s.len() == VIDEO_ID_LEN && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract the stable video identifier from user input.
///
/// Accepts a full watch URL (the `v` query parameter), a youtu.be short link,
/// or a bare 11-character id. Returns None for anything else — playback can
/// still proceed on a raw URL, but without an id the clip settings are not
/// persisted.
pub fn video_id_from_input(input: &str) -> Option<String> {
  let trimmed = input.trim();
  if looks_like_id(trimmed) {
    return Some(trimmed.to_string());
  }

  // watch?v=ID — the query parameter is the identifier.
  if let Some((_, query)) = trimmed.split_once('?') {
    for pair in query.split('&') {
      if let Some(value) = pair.strip_prefix("v=") {
        let id = value.split('#').next().unwrap_or(value);
        if looks_like_id(id) {
          return Some(id.to_string());
        }
      }
    }
  }

  // youtu.be/ID short links.
  if let Some((_, rest)) = trimmed.split_once("youtu.be/") {
    let id = rest.split(['?', '&', '#', '/']).next().unwrap_or(rest);
    if looks_like_id(id) {
      return Some(id.to_string());
    }
  }

  None
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
  format!("https://www.youtube.com/watch?v={}", video_id)
}

use std::time::{Duration, Instant};

use tracing::info;

use crate::clip::ClipSettings;
use crate::config::Config;
use crate::constants::constants;
use crate::input::TextField;
use crate::looper::LoopController;
use crate::player::MpvPlayer;
use crate::store::ClipStore;
use crate::theme::THEMES;
use crate::timecode::format_time;
use crate::youtube::{video_id_from_input, watch_url};

// --- Types ---

/// Which control currently receives edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Start,
  End,
  Count,
  Infinite,
}

impl Field {
  pub const ALL: [Field; 4] = [Field::Start, Field::End, Field::Count, Field::Infinite];
}

/// Command-line overrides applied on top of the loaded clip record.
#[derive(Debug, Default, Clone)]
pub struct ClipPresets {
  pub start: Option<u64>,
  pub end: Option<u64>,
  pub count: Option<u32>,
  pub infinite: bool,
}

// --- App State ---

pub struct App {
  pub video_id: Option<String>,
  pub url: String,
  pub player: MpvPlayer,
  pub looper: LoopController,
  pub store: ClipStore,
  /// Last committed settings; the live field text is authoritative between
  /// commits and is what the loop controller evaluates against.
  pub settings: ClipSettings,
  pub start_field: TextField,
  pub end_field: TextField,
  pub count_field: TextField,
  pub infinite: bool,
  pub focus: Field,
  pub theme_index: usize,
  pub last_error: Option<String>,
  /// Informational message — shown with info icon, lower priority than errors.
  pub info_message: Option<String>,
  pub should_quit: bool,
  /// When the last error was set — used for auto-dismiss.
  error_time: Option<Instant>,
  /// True until a reported duration fills in the default clip end (only when
  /// no persisted record and no preset provided one).
  end_defaulted: bool,
}

impl App {
  pub fn new(video: &str, presets: ClipPresets, store: ClipStore) -> Self {
    let config = Config::load();
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };

    let video_id = video_id_from_input(video);
    let url = video_id.as_deref().map(watch_url).unwrap_or_else(|| video.trim().to_string());

    let loaded = video_id.as_deref().and_then(|id| store.load(id));
    let had_record = loaded.is_some();
    info!(video_id = ?video_id, had_record, "app: starting");

    let mut settings = loaded.unwrap_or_else(|| ClipSettings::defaults(None));
    if let Some(start) = presets.start {
      settings.start = start;
    }
    if let Some(end) = presets.end {
      settings.end = end;
    }
    if let Some(count) = presets.count {
      settings.count = count.max(1);
    }
    if presets.infinite {
      settings.infinite = true;
    }
    let end_defaulted = !had_record && presets.end.is_none();

    let mut start_field = TextField::default();
    start_field.set(format_time(settings.start));
    let mut end_field = TextField::default();
    end_field.set(format_time(settings.end));
    let mut count_field = TextField::default();
    count_field.set(settings.count.to_string());
    let infinite = settings.infinite;

    Self {
      video_id,
      url,
      player: MpvPlayer::new(),
      looper: LoopController::new(),
      store,
      settings,
      start_field,
      end_field,
      count_field,
      infinite,
      focus: Field::Start,
      theme_index,
      last_error: None,
      info_message: None,
      should_quit: false,
      error_time: None,
      end_defaulted,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    Config { theme_name: Some(self.theme().name.to_string()) }.save();
  }

  // --- Messages ---

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages once their time-to-live is up.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_ttl_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Focus ---

  pub fn focus_next(&mut self) {
    let idx = Field::ALL.iter().position(|f| *f == self.focus).unwrap_or(0);
    self.focus = Field::ALL[(idx + 1) % Field::ALL.len()];
  }

  pub fn focus_prev(&mut self) {
    let idx = Field::ALL.iter().position(|f| *f == self.focus).unwrap_or(0);
    self.focus = Field::ALL[(idx + Field::ALL.len() - 1) % Field::ALL.len()];
  }

  pub fn focused_field_mut(&mut self) -> Option<&mut TextField> {
    match self.focus {
      Field::Start => Some(&mut self.start_field),
      Field::End => Some(&mut self.end_field),
      Field::Count => Some(&mut self.count_field),
      Field::Infinite => None,
    }
  }

  // --- Clip settings ---

  /// The commit boundary for whatever is currently typed into the fields.
  /// Malformed time text reads as 0, a bad count as 1.
  pub fn current_settings(&self) -> ClipSettings {
    ClipSettings::from_fields(&self.start_field.text, &self.end_field.text, &self.count_field.text, self.infinite)
  }

  pub fn toggle_infinite(&mut self) {
    self.infinite = !self.infinite;
  }

  /// Commit the live fields, re-render them normalized, and persist the
  /// record for this video id. Without an id the save is session-only.
  pub fn save_settings(&mut self) {
    let settings = self.current_settings();
    self.start_field.set(format_time(settings.start));
    self.end_field.set(format_time(settings.end));
    self.count_field.set(settings.count.to_string());
    self.settings = settings;
    self.end_defaulted = false;

    match self.video_id.as_deref() {
      Some(id) => match self.store.save(id, &self.settings) {
        Ok(()) => self.info_message = Some(format!("Saved clip for {}.", id)),
        Err(e) => self.set_error(format!("Save failed: {:#}", e)),
      },
      // Not an error: playback without a recognized video id just does not persist.
      None => self.info_message = Some("Saved for this session only (no video id).".to_string()),
    }
  }

  /// Copy the current playback position into the start field.
  pub fn capture_start(&mut self) {
    let pos = self.player.position() as u64;
    self.start_field.set(format_time(pos));
  }

  /// Copy the current playback position into the end field.
  pub fn capture_end(&mut self) {
    let pos = self.player.position() as u64;
    self.end_field.set(format_time(pos));
  }

  // --- Playback / loop ---

  /// Drain player events, fill in the default clip end once the duration is
  /// known, and let the loop controller evaluate any new positions against
  /// the live field values.
  pub fn check_player(&mut self) {
    self.player.pump();

    if self.end_defaulted
      && let Some(duration) = self.player.duration()
    {
      // No persisted record: the default clip covers the whole video.
      let end = duration as u64;
      self.end_field.set(format_time(end));
      self.settings.end = end;
      self.end_defaulted = false;
    }

    let was_active = self.looper.is_active();
    let settings = self.current_settings();
    self.looper.poll(&settings, &mut self.player);
    if was_active && !self.looper.is_active() {
      self.info_message = Some("Loop finished.".to_string());
    }
  }

  pub fn start_loop(&mut self) {
    if !self.player.is_playing() {
      self.set_error("No active playback to loop.".to_string());
      return;
    }
    let settings = self.current_settings();
    if !settings.is_loopable() {
      // Degenerate clips are accepted, they just never rewind.
      self.info_message = Some("Clip start is not before end; playback will not rewind.".to_string());
    } else {
      self.info_message = None;
    }
    self.looper.start(&settings, &mut self.player);
  }

  pub fn stop_loop(&mut self) {
    self.looper.stop(&mut self.player);
  }

  pub fn toggle_pause(&mut self) {
    if self.player.is_playing() {
      self.player.toggle_pause();
    }
  }
}

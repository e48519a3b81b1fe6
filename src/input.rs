use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, Field};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Text fields ---

/// A single-line editable field with a char cursor and horizontal scroll.
#[derive(Default)]
pub struct TextField {
  pub text: String,
  pub cursor: usize,
  pub scroll: usize,
}

impl TextField {
  /// Replace the contents and put the cursor at the end.
  pub fn set(&mut self, text: String) {
    self.cursor = text.chars().count();
    self.scroll = 0;
    self.text = text;
  }

  pub fn insert(&mut self, c: char) {
    let byte_idx = char_to_byte_index(&self.text, self.cursor);
    self.text.insert(byte_idx, c);
    self.cursor += 1;
  }

  pub fn backspace(&mut self) {
    if self.cursor > 0 {
      self.cursor -= 1;
      let byte_idx = char_to_byte_index(&self.text, self.cursor);
      self.text.remove(byte_idx);
    }
  }

  pub fn delete(&mut self) {
    if self.cursor < self.text.chars().count() {
      let byte_idx = char_to_byte_index(&self.text, self.cursor);
      self.text.remove(byte_idx);
    }
  }

  pub fn left(&mut self) {
    self.cursor = self.cursor.saturating_sub(1);
  }

  pub fn right(&mut self) {
    if self.cursor < self.text.chars().count() {
      self.cursor += 1;
    }
  }

  pub fn home(&mut self) {
    self.cursor = 0;
  }

  pub fn end(&mut self) {
    self.cursor = self.text.chars().count();
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('p') => app.toggle_pause(),
      KeyCode::Char('b') => app.capture_start(),
      KeyCode::Char('e') => app.capture_end(),
      KeyCode::Char('s') => app.save_settings(),
      _ => {}
    }
    return;
  }

  match key.code {
    KeyCode::Tab => app.focus_next(),
    KeyCode::BackTab => app.focus_prev(),
    KeyCode::Enter => app.start_loop(),
    KeyCode::Esc => {
      if app.looper.is_active() {
        app.stop_loop();
      } else {
        app.should_quit = true;
      }
    }
    _ => handle_field_key(app, key),
  }
}

fn handle_field_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();

  if app.focus == Field::Infinite {
    if key.code == KeyCode::Char(' ') {
      app.toggle_infinite();
    }
    return;
  }

  let Some(field) = app.focused_field_mut() else { return };
  match key.code {
    KeyCode::Char(c) => field.insert(c),
    KeyCode::Backspace => field.backspace(),
    KeyCode::Delete => field.delete(),
    KeyCode::Left => field.left(),
    KeyCode::Right => field.right(),
    KeyCode::Home => field.home(),
    KeyCode::End => field.end(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0); // 'a'
    assert_eq!(char_to_byte_index(s, 1), 1); // 'é' starts at byte 1
    assert_eq!(char_to_byte_index(s, 2), 3); // '日' starts at byte 3
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- TextField ---

  #[test]
  fn text_field_insert_and_delete() {
    let mut field = TextField::default();
    for c in "1:23".chars() {
      field.insert(c);
    }
    assert_eq!(field.text, "1:23");
    assert_eq!(field.cursor, 4);

    field.backspace();
    assert_eq!(field.text, "1:2");

    field.home();
    field.delete();
    assert_eq!(field.text, ":2");
  }

  #[test]
  fn text_field_cursor_stays_in_bounds() {
    let mut field = TextField::default();
    field.set("42".to_string());
    field.right();
    field.right();
    assert_eq!(field.cursor, 2);
    field.left();
    field.left();
    field.left();
    assert_eq!(field.cursor, 0);
    field.backspace(); // no-op at the start
    assert_eq!(field.text, "42");
  }

  #[test]
  fn text_field_set_moves_cursor_to_end() {
    let mut field = TextField::default();
    field.set("00:01:10".to_string());
    assert_eq!(field.cursor, 8);
    assert_eq!(field.scroll, 0);
  }
}

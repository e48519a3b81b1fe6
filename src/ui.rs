use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Padding, Paragraph},
};

use crate::app::{App, Field};
use crate::input::TextField;
use crate::theme::Theme;
use crate::timecode::format_time;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(13), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, theme, header_area);

  let [clip_area, playback_area] = Layout::horizontal([Constraint::Length(36), Constraint::Min(26)]).areas(main_area);
  render_clip_panel(frame, app, clip_area);
  render_playback_panel(frame, app, playback_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ⟳ ytloop ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_clip_panel(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(" Clip ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [start_area, end_area, count_area, infinite_area] =
    Layout::vertical([Constraint::Length(3), Constraint::Length(3), Constraint::Length(3), Constraint::Length(1)])
      .areas(inner);

  let focus = app.focus;
  let infinite = app.infinite;
  render_field(frame, theme, &mut app.start_field, " Start ", focus == Field::Start, false, start_area);
  render_field(frame, theme, &mut app.end_field, " End ", focus == Field::End, false, end_area);
  // The count box is inert while the infinite toggle is on.
  render_field(frame, theme, &mut app.count_field, " Count ", focus == Field::Count, infinite, count_area);

  let mark = if app.infinite { "x" } else { " " };
  let style = if focus == Field::Infinite {
    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(theme.fg)
  };
  let line = Line::from(vec![
    Span::styled(format!(" [{}] Infinite", mark), style),
    Span::styled("  Space toggles", Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(Paragraph::new(line), infinite_area);
}

/// One bordered single-line input, scrolled so the cursor stays visible.
fn render_field(
  frame: &mut Frame,
  theme: &Theme,
  field: &mut TextField,
  title: &str,
  focused: bool,
  dimmed: bool,
  area: Rect,
) {
  let border_color = if focused {
    theme.accent
  } else if dimmed {
    theme.muted
  } else {
    theme.border
  };
  let text_color = if dimmed { theme.muted } else { theme.fg };
  let block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&field.text, field.cursor);

  if cursor_col < field.scroll {
    field.scroll = cursor_col;
  } else if cursor_col >= field.scroll + inner_w {
    field.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = field
    .text
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= field.scroll)
    .take_while(|(start, _, _)| *start < field.scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(text_color)).block(block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - field.scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_playback_panel(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(" Playback ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let settings = app.current_settings();

  let position = format_time(app.player.position() as u64);
  let duration = app.player.duration().map_or_else(|| "--:--:--".to_string(), |d| format_time(d as u64));
  let player_state = if !app.player.is_playing() {
    "stopped"
  } else if app.player.paused {
    "paused"
  } else {
    "playing"
  };

  let loop_line = if app.looper.is_active() {
    let playthrough = app.looper.completed_cycles() + 1;
    if settings.infinite {
      format!("looping ∞ (playthrough {})", playthrough)
    } else {
      format!("looping {}/{}", playthrough, settings.count)
    }
  } else {
    "idle".to_string()
  };
  let loop_style = if app.looper.is_active() {
    Style::default().fg(theme.status).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(theme.muted)
  };

  let mut clip_spans = vec![
    Span::styled("Range     ", Style::default().fg(theme.muted)),
    Span::styled(format!("{} → {}", format_time(settings.start), format_time(settings.end)), Style::default().fg(theme.fg)),
  ];
  if !settings.is_loopable() {
    clip_spans.push(Span::styled("  (empty, will not rewind)", Style::default().fg(theme.error)));
  }

  let video_line = match app.video_id.as_deref() {
    Some(id) => Line::from(vec![
      Span::styled("Video     ", Style::default().fg(theme.muted)),
      Span::styled(id.to_string(), Style::default().fg(theme.fg)),
    ]),
    None => Line::from(vec![
      Span::styled("Video     ", Style::default().fg(theme.muted)),
      Span::styled("(no id — settings not persisted)", Style::default().fg(theme.muted)),
    ]),
  };

  let lines = vec![
    Line::from(""),
    video_line,
    Line::from(vec![
      Span::styled("Position  ", Style::default().fg(theme.muted)),
      Span::styled(format!("{} / {}", position, duration), Style::default().fg(theme.fg)),
      Span::styled(format!("  ({})", player_state), Style::default().fg(theme.muted)),
    ]),
    Line::from(clip_spans),
    Line::from(""),
    Line::from(vec![Span::styled("Loop      ", Style::default().fg(theme.muted)), Span::styled(loop_line, loop_style)]),
    Line::from(""),
    Line::from(Span::styled(
      truncate_str(&app.url, inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )),
  ];

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ♪ {}", info), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let looping = app.looper.is_active();
  let pause_label = if app.player.paused { "Resume" } else { "Pause" };
  let esc_label = if looping { "Stop loop" } else { "Quit" };

  let keys: Vec<(&str, &str)> = vec![
    ("Tab", "Field"),
    ("Enter", "Loop"),
    ("Esc", esc_label),
    ("^b/^e", "Mark start/end"),
    ("^s", "Save"),
    ("^p", pause_label),
    ("^t", "Theme"),
  ];

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

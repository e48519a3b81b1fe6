use ratatui::style::Color;

/// A named UI palette, cycled with Ctrl+T and persisted by name.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: &[Theme] = &[
  Theme {
    name: "dusk",
    bg: Color::Rgb(30, 30, 46),
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(250, 179, 135),
    muted: Color::Rgb(108, 112, 134),
    border: Color::Rgb(69, 71, 90),
    status: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    key_fg: Color::Rgb(30, 30, 46),
    key_bg: Color::Rgb(250, 179, 135),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(60, 56, 54),
    accent: Color::Rgb(175, 58, 3),
    muted: Color::Rgb(146, 131, 116),
    border: Color::Rgb(213, 196, 161),
    status: Color::Rgb(121, 116, 14),
    error: Color::Rgb(157, 0, 6),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(175, 58, 3),
  },
  Theme {
    name: "terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Yellow,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    status: Color::Green,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Yellow,
  },
];

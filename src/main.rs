mod app;
mod clip;
mod config;
mod constants;
mod input;
mod looper;
mod player;
mod store;
mod theme;
mod timecode;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::info;

use app::{App, ClipPresets};
use constants::constants;
use store::{ClipStore, FileKvStore};
use timecode::parse_time;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Loop a clip of a YouTube video from the terminal", long_about = None)]
struct Args {
  /// Watch URL, youtu.be link, or bare video id
  video: String,

  /// Clip start as hh:mm:ss, mm:ss or ss (overrides the saved clip)
  #[arg(long)]
  start: Option<String>,

  /// Clip end as hh:mm:ss, mm:ss or ss (overrides the saved clip)
  #[arg(long)]
  end: Option<String>,

  /// Playthroughs before the loop stops (overrides the saved clip)
  #[arg(long)]
  count: Option<u32>,

  /// Repeat forever until stopped
  #[arg(long)]
  infinite: bool,
}

impl Args {
  fn presets(&self) -> ClipPresets {
    // Time presets follow the codec contract: malformed text reads as 0.
    ClipPresets {
      start: self.start.as_deref().map(parse_time),
      end: self.end.as_deref().map(parse_time),
      count: self.count,
      infinite: self.infinite,
    }
  }
}

// --- Logging ---

/// Route tracing to a log file; the terminal belongs to the UI. The returned
/// guard must stay alive so buffered lines flush on exit.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let dirs = directories::ProjectDirs::from("", "", "ytloop")?;
  let log_dir = dirs.data_local_dir().join("logs");
  std::fs::create_dir_all(&log_dir).ok()?;

  let appender = tracing_appender::rolling::never(log_dir, &constants().log_file);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = init_tracing();
  info!(video = %args.video, "ytloop starting");

  let kv = FileKvStore::open_default().context("Failed to open the clip store")?;
  let mut app = App::new(&args.video, args.presets(), ClipStore::new(Box::new(kv)));

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  app.player.shutdown().await?;
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  let url = app.url.clone();
  app.player.launch(&url).await?;

  loop {
    app.check_player();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(constants().tick_ms))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.stop_loop();
  Ok(())
}

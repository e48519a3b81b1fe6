use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use std::time::Duration;
use tokio::{
  io::BufReader as TokioBufReader,
  io::{AsyncBufReadExt, AsyncWriteExt},
  net::UnixStream,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::looper::{MediaHandle, PositionBus, Subscription};

// --- IPC messages ---

/// Commands enqueued for the IPC writer task. Enqueueing is O(1) and never
/// blocks; the loop controller calls these from the hot position-event path.
#[derive(Debug, Clone, Copy)]
pub enum PlayerCommand {
  Seek(f64),
  Play,
  Pause,
}

/// Property changes parsed off the IPC socket by the monitor task.
#[derive(Debug, Clone, Copy)]
enum PlayerEvent {
  Position(f64),
  Duration(f64),
}

// --- Player ---

/// mpv behind its JSON IPC socket: one monitor task streams `time-pos` and
/// `duration` property changes into a channel, one writer task executes
/// queued commands. All state mutation happens on the UI thread in [`pump`].
///
/// [`pump`]: MpvPlayer::pump
pub struct MpvPlayer {
  current_process: Option<TokioChild>,
  cmd_tx: Option<mpsc::UnboundedSender<PlayerCommand>>,
  event_rx: Option<mpsc::UnboundedReceiver<PlayerEvent>>,
  monitor_handle: Option<JoinHandle<()>>,
  command_handle: Option<JoinHandle<()>>,
  ipc_socket_path: Option<String>,
  bus: PositionBus,
  position: f64,
  duration: Option<f64>,
  pub paused: bool,
}

impl MpvPlayer {
  pub fn new() -> Self {
    Self {
      current_process: None,
      cmd_tx: None,
      event_rx: None,
      monitor_handle: None,
      command_handle: None,
      ipc_socket_path: None,
      bus: PositionBus::default(),
      position: 0.0,
      duration: None,
      paused: false,
    }
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  /// Last position reported by mpv, fractional seconds.
  pub fn position(&self) -> f64 {
    self.position
  }

  pub fn duration(&self) -> Option<f64> {
    self.duration
  }

  pub async fn launch(&mut self, url: &str) -> Result<()> {
    self.shutdown().await.context("Failed to stop previous playback")?;

    let socket_path = std::env::temp_dir().join(format!("{}{}.sock", constants().mpv_socket_prefix, std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args([
      // mpv exits at EOF by default; a clip ending at the video's end needs
      // the player alive for the rewind.
      "--keep-open=yes",
      "--force-window=yes",
      "--no-terminal",
      &format!("--input-ipc-server={}", socket_path_str),
      url,
    ]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<PlayerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<PlayerCommand>();

    let monitor_socket = socket_path_str.clone();
    let monitor_handle = tokio::spawn(async move {
      if let Err(e) = monitor_ipc(&monitor_socket, event_tx).await {
        warn!(err = %e, "player: IPC monitor ended");
      }
    });

    let command_socket = socket_path_str.clone();
    let command_handle = tokio::spawn(async move {
      if let Err(e) = run_commands(&command_socket, cmd_rx).await {
        warn!(err = %e, "player: IPC command writer ended");
      }
    });

    info!(url = %url, socket = %socket_path_str, "player: mpv launched");
    self.current_process = Some(child);
    self.cmd_tx = Some(cmd_tx);
    self.event_rx = Some(event_rx);
    self.monitor_handle = Some(monitor_handle);
    self.command_handle = Some(command_handle);
    self.ipc_socket_path = Some(socket_path_str);
    Ok(())
  }

  /// Drain pending property changes on the UI thread: cache position and
  /// duration for display and publish each position to the bus. This is the
  /// single point where position events enter the app, which keeps delivery
  /// single-threaded and makes unsubscribe synchronous for subscribers.
  pub fn pump(&mut self) {
    let Some(rx) = self.event_rx.as_mut() else { return };
    while let Ok(event) = rx.try_recv() {
      match event {
        PlayerEvent::Position(pos) => {
          self.position = pos;
          self.bus.publish(pos);
        }
        PlayerEvent::Duration(d) => {
          self.duration = Some(d);
        }
      }
    }
  }

  pub fn toggle_pause(&mut self) {
    let cmd = if self.paused { PlayerCommand::Play } else { PlayerCommand::Pause };
    self.send(cmd);
  }

  fn send(&mut self, cmd: PlayerCommand) {
    if let Some(tx) = &self.cmd_tx
      && tx.send(cmd).is_err()
    {
      warn!("player: command channel closed");
    }
    match cmd {
      PlayerCommand::Play => self.paused = false,
      PlayerCommand::Pause => self.paused = true,
      PlayerCommand::Seek(_) => {}
    }
  }

  pub async fn shutdown(&mut self) -> Result<()> {
    if let Some(handle) = self.monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    if let Some(handle) = self.command_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.cmd_tx = None;
    self.event_rx = None;

    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
    }

    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    self.position = 0.0;
    self.duration = None;
    self.paused = false;
    Ok(())
  }
}

impl MediaHandle for MpvPlayer {
  fn seek(&mut self, seconds: f64) {
    self.send(PlayerCommand::Seek(seconds));
  }

  fn play(&mut self) {
    self.send(PlayerCommand::Play);
  }

  fn pause(&mut self) {
    self.send(PlayerCommand::Pause);
  }

  fn watch(&mut self) -> Subscription {
    self.bus.subscribe()
  }
}

// --- IPC tasks ---

/// Connect to mpv's IPC socket, waiting out the window where mpv has not
/// created it yet.
async fn connect_ipc(socket_path: &str) -> Result<UnixStream> {
  for attempt in 0..constants().ipc_connect_attempts {
    let delay = match attempt {
      0 => Duration::from_millis(500),
      1 => Duration::from_secs(1),
      _ => Duration::from_secs(2),
    };
    tokio::time::sleep(delay).await;

    match UnixStream::connect(socket_path).await {
      Ok(stream) => return Ok(stream),
      Err(e) => debug!(attempt, err = %e, "player: mpv IPC connect failed, retrying"),
    }
  }
  Err(anyhow!("mpv IPC socket never became connectable at {}", socket_path))
}

/// Observe `time-pos` and `duration` and forward every change.
async fn monitor_ipc(socket_path: &str, tx: mpsc::UnboundedSender<PlayerEvent>) -> Result<()> {
  let mut stream = connect_ipc(socket_path).await?;

  stream
    .write_all(b"{\"command\":[\"observe_property\",1,\"time-pos\"]}\n")
    .await
    .context("Failed to observe time-pos on mpv IPC")?;
  stream
    .write_all(b"{\"command\":[\"observe_property\",2,\"duration\"]}\n")
    .await
    .context("Failed to observe duration on mpv IPC")?;

  let reader = TokioBufReader::new(stream);
  let mut lines = reader.lines();
  while let Ok(Some(line)) = lines.next_line().await {
    let Ok(val) = serde_json::from_str::<serde_json::Value>(&line) else { continue };
    if val.get("event").and_then(|v| v.as_str()) != Some("property-change") {
      continue;
    }
    let Some(data) = val.get("data").and_then(|v| v.as_f64()) else { continue };
    let event = match val.get("name").and_then(|v| v.as_str()) {
      Some("time-pos") => PlayerEvent::Position(data),
      Some("duration") => PlayerEvent::Duration(data),
      _ => continue,
    };
    if tx.send(event).is_err() {
      break;
    }
  }
  Ok(())
}

/// Execute queued commands over a dedicated IPC connection.
async fn run_commands(socket_path: &str, mut rx: mpsc::UnboundedReceiver<PlayerCommand>) -> Result<()> {
  let mut stream = connect_ipc(socket_path).await?;

  while let Some(cmd) = rx.recv().await {
    let payload = match cmd {
      PlayerCommand::Seek(seconds) => serde_json::json!({"command": ["set_property", "time-pos", seconds]}),
      PlayerCommand::Play => serde_json::json!({"command": ["set_property", "pause", false]}),
      PlayerCommand::Pause => serde_json::json!({"command": ["set_property", "pause", true]}),
    };
    let mut line = payload.to_string();
    line.push('\n');
    stream.write_all(line.as_bytes()).await.context("Failed to write command to mpv IPC socket")?;
  }
  Ok(())
}

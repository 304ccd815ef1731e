//! kmnet command-line client.
//!
//! Drives a kmnet box over UDP: inject pointer and keyboard input, watch the
//! physical keyboard and mouse, reboot the box.
//!
//! # Usage
//!
//! ```text
//! kmnet [OPTIONS] <COMMAND>
//!
//! Commands:
//!   demo         Move the pointer, type Shift+H, then print physical input until Ctrl+C
//!   watch        Print physical input until Ctrl+C
//!   move         Move the pointer by DX, DY
//!   press        Press and release one key
//!   reboot       Reboot the box
//!   save-config  Write the effective settings to the config file
//! ```
//!
//! # Settings
//!
//! Settings come from the config file (see
//! [`kmnet_client::infrastructure::storage::config`]) and can be overridden
//! per invocation.  CLI args take precedence over environment variables,
//! which take precedence over the file.
//!
//! | Variable             | Flag             | Default         |
//! |----------------------|------------------|-----------------|
//! | `KMNET_HOST`         | `--host`         | `192.168.2.188` |
//! | `KMNET_PORT`         | `--port`         | `8888`          |
//! | `KMNET_UUID`         | `--uuid`         | (none)          |
//! | `KMNET_MONITOR_PORT` | `--monitor-port` | `12345`         |
//! | `KMNET_CONFIG`       | `--config`       | platform path   |
//!
//! # Threads
//!
//! Device commands block on a UDP round trip, so they run on Tokio's blocking
//! pool.  The event monitor owns its own thread.  The async main task only
//! waits for Ctrl+C.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kmnet_client::application::DeviceSession;
use kmnet_client::infrastructure::{
    monitor::{EventMonitor, MonitorEvent},
    network::UdpTransport,
    storage::config::{self, AppConfig},
};
use kmnet_core::{DeviceId, HardKeyboard, HardMouse, HidKeyCode};

type Session = DeviceSession<UdpTransport>;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line client for networked keyboard/mouse injection boxes.
#[derive(Debug, Parser)]
#[command(
    name = "kmnet",
    about = "Command-line client for networked keyboard/mouse injection boxes",
    version
)]
struct Cli {
    /// IP address or host name of the box.
    #[arg(long, global = true, env = "KMNET_HOST")]
    host: Option<String>,

    /// UDP command port of the box.
    #[arg(long, global = true, env = "KMNET_PORT")]
    port: Option<u16>,

    /// UUID shown on the box screen, e.g. `0B50E466`.
    #[arg(long, global = true, env = "KMNET_UUID")]
    uuid: Option<String>,

    /// Local UDP port the box streams physical input to.
    #[arg(long, global = true, env = "KMNET_MONITOR_PORT")]
    monitor_port: Option<u16>,

    /// Send pointer and keyboard commands as encrypted frames.
    #[arg(long, global = true)]
    encrypted: bool,

    /// Config file to use instead of the platform default.
    #[arg(long, global = true, env = "KMNET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Move the pointer, type Shift+H, then print physical input until Ctrl+C.
    Demo,
    /// Print physical input until Ctrl+C.
    Watch,
    /// Move the pointer by DX, DY.
    Move {
        #[arg(allow_negative_numbers = true)]
        dx: i32,
        #[arg(allow_negative_numbers = true)]
        dy: i32,
    },
    /// Press and release one key (`KeyH`, `h`, `Enter`, `0x28`, ...).
    Press {
        key: HidKeyCode,
        /// Total press duration in milliseconds.
        #[arg(long, default_value_t = 50)]
        ms: u64,
    },
    /// Reboot the box.
    Reboot,
    /// Write the effective settings to the config file.
    SaveConfig,
}

impl Cli {
    /// Loads the config file and applies CLI/env overrides on top.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let file = match &self.config {
            Some(path) => config::load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => config::load_config().context("failed to load config")?,
        };
        Ok(self.apply_overrides(file))
    }

    fn apply_overrides(&self, mut cfg: AppConfig) -> AppConfig {
        if let Some(host) = &self.host {
            cfg.device.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.device.port = port;
        }
        if let Some(uuid) = &self.uuid {
            cfg.device.uuid = uuid.clone();
        }
        if let Some(port) = self.monitor_port {
            cfg.network.monitor_port = port;
        }
        if self.encrypted {
            cfg.device.encrypted = true;
        }
        cfg
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    match cli.command {
        Command::Demo => run_demo(&cfg).await,
        Command::Watch => run_watch(&cfg).await,
        Command::Move { dx, dy } => {
            let session = connect(&cfg).await?;
            with_session(session, move |s| Ok(s.mouse_move(dx, dy)?)).await?;
            Ok(())
        }
        Command::Press { key, ms } => {
            let session = connect(&cfg).await?;
            with_session(session, move |s| Ok(s.keypress(key, ms)?)).await?;
            Ok(())
        }
        Command::Reboot => {
            let session = connect(&cfg).await?;
            with_session(session, |s| Ok(s.reboot()?)).await?;
            Ok(())
        }
        Command::SaveConfig => {
            let path = match &cli.config {
                Some(path) => {
                    config::save_config_to(&cfg, path)?;
                    path.clone()
                }
                None => config::save_config(&cfg)?,
            };
            info!("config written to {}", path.display());
            Ok(())
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run_demo(cfg: &AppConfig) -> anyhow::Result<()> {
    let monitor_port = cfg.network.monitor_port;
    let poll = cfg.network.monitor_poll_interval();
    let session = connect(cfg).await?;

    let (session, monitor) = with_session(session, move |s| {
        s.mouse_move(100, 100)?;
        std::thread::sleep(Duration::from_secs(1));
        s.mouse_move(-100, -100)?;

        s.keydown(HidKeyCode::ShiftLeft)?;
        s.keypress(HidKeyCode::KeyH, 50)?;
        s.keyup(HidKeyCode::ShiftLeft)?;

        let monitor = EventMonitor::start_with_poll_interval(monitor_port, poll, print_event)?;
        monitor.attach(s)?;
        Ok(monitor)
    })
    .await?;

    println!("Monitoring... Press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("shutdown signal received");

    stop_streaming(session, monitor).await;
    Ok(())
}

async fn run_watch(cfg: &AppConfig) -> anyhow::Result<()> {
    let monitor_port = cfg.network.monitor_port;
    let poll = cfg.network.monitor_poll_interval();
    let (monitor, mut events) = EventMonitor::channel(monitor_port, poll)
        .with_context(|| format!("failed to start monitor on port {monitor_port}"))?;

    let session = connect(cfg).await?;
    let (session, monitor) = with_session(session, move |s| {
        monitor.attach(s)?;
        Ok(monitor)
    })
    .await?;

    println!("Monitoring... Press Ctrl+C to stop");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(MonitorEvent { mouse, keyboard }) => print_event(mouse, keyboard),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                info!("shutdown signal received");
                break;
            }
        }
    }

    drop(events);
    stop_streaming(session, monitor).await;
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Connects to the configured box on the blocking pool.
async fn connect(cfg: &AppConfig) -> anyhow::Result<Session> {
    let device = DeviceId::parse(&cfg.device.uuid)
        .context("device UUID missing or invalid (set --uuid or KMNET_UUID)")?;
    let host = cfg.device.host.clone();
    let port = cfg.device.port;
    let transport_cfg = cfg.network.transport();
    let encrypted = cfg.device.encrypted;

    info!("connecting to {host}:{port} (device {device})");
    let mut session = tokio::task::spawn_blocking(move || -> anyhow::Result<Session> {
        let transport = UdpTransport::connect(&host, port, transport_cfg)?;
        Ok(DeviceSession::connect(transport, device)?)
    })
    .await
    .context("connect task panicked")?
    .with_context(|| format!("failed to connect to {}:{}", cfg.device.host, cfg.device.port))?;

    session.set_encrypted(encrypted);
    Ok(session)
}

/// Runs blocking device commands on the blocking pool and hands the session
/// back.
async fn with_session<R, F>(mut session: Session, op: F) -> anyhow::Result<(Session, R)>
where
    F: FnOnce(&mut Session) -> anyhow::Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&mut session).map(|r| (session, r)))
        .await
        .context("device task panicked")?
}

/// Stops the monitor thread, then tells the box to stop streaming.
///
/// Failures are logged, not returned: this runs on the way out.
async fn stop_streaming(mut session: Session, mut monitor: EventMonitor) {
    let outcome = tokio::task::spawn_blocking(move || monitor.detach(&mut session)).await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("failed to disable monitor stream (code {}): {e}", e.code()),
        Err(e) => warn!("monitor shutdown task failed: {e}"),
    }
}

fn print_event(mouse: HardMouse, keyboard: HardKeyboard) {
    for line in describe_event(&mouse, &keyboard) {
        println!("{line}");
    }
}

/// Formats one monitor event, skipping idle halves.
fn describe_event(mouse: &HardMouse, keyboard: &HardKeyboard) -> Vec<String> {
    let mut lines = Vec::new();

    if mouse.buttons != 0 || mouse.x != 0 || mouse.y != 0 {
        lines.push(format!(
            "Mouse: {}, {}, btn={}",
            mouse.x, mouse.y, mouse.buttons
        ));
    }

    let keys: Vec<String> = keyboard
        .pressed_keys()
        .map(|k| match HidKeyCode::from_u8(k) {
            Some(code) => code.name().to_string(),
            None => format!("0x{k:02X}"),
        })
        .collect();
    if keyboard.buttons != 0 || !keys.is_empty() {
        lines.push(format!(
            "Keyboard: mods=0x{:02X} keys=[{}]",
            keyboard.buttons,
            keys.join(", ")
        ));
    }

    lines
}

// ── Tests ─────────────────────────────────────────────────────────────────────

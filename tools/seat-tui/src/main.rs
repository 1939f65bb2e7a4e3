//! Seat-TUI: terminal dashboard for live library seat occupancy.
//!
//! Connects to the occupancy backend's WebSocket feed and renders every
//! snapshot it pushes. The backend is an external service; this tool only
//! reads from it.
//!
//! ## Usage
//!
//! ```bash
//! # Local backend (default)
//! seat-tui
//!
//! # Hosted backend, seeded from its status endpoint
//! seat-tui --ws-url wss://seats.example.org/ws --seed-url https://seats.example.org/status
//!
//! # No terminal UI, print each change to stdout
//! seat-tui --headless
//! ```

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use seat_tui::config::DashboardConfig;
use seat_tui::logging::{init_logging, LogTarget};
use seat_tui::sync::{LiveSyncClient, RetryPolicy, SyncEvent};
use seat_tui::{render_plain, ui, App};

/// Capacity of the sync event channel.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Terminal poll timeout; also the redraw cadence for the staleness check.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Library seat occupancy dashboard
#[derive(Parser, Debug)]
#[command(name = "seat-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint URL
    #[arg(long)]
    ws_url: Option<String>,

    /// HTTP endpoint for the initial snapshot
    #[arg(long)]
    seed_url: Option<String>,

    /// Delay before each reconnect attempt, in milliseconds
    #[arg(long)]
    retry_interval_ms: Option<u64>,

    /// Give up after this many consecutive failed reconnects (0 = never reconnect)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Double the reconnect delay per attempt, up to this many milliseconds
    #[arg(long)]
    exponential_backoff_max_ms: Option<u64>,

    /// Silence on a live connection before the feed shows as paused, in milliseconds
    #[arg(long)]
    stale_after_ms: Option<u64>,

    /// Footer notice line (repeatable)
    #[arg(long = "notice")]
    notices: Vec<String>,

    /// Print snapshots to stdout instead of drawing the terminal UI
    #[arg(long)]
    headless: bool,

    /// Log file used by the terminal UI
    #[arg(long, default_value = "seat-tui.log")]
    log_file: PathBuf,

    /// Log filter when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

/// Merge the config file (if any) with CLI overrides and validate.
fn build_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    if let Some(ws_url) = &args.ws_url {
        config.sync.ws_url = ws_url.clone();
    }
    if let Some(seed_url) = &args.seed_url {
        config.sync.seed_url = Some(seed_url.clone());
    }
    if let Some(ms) = args.retry_interval_ms {
        config.sync.retry.interval = Duration::from_millis(ms);
    }
    if let Some(max) = args.max_retries {
        config.sync.retry = match max {
            0 => RetryPolicy {
                interval: config.sync.retry.interval,
                ..RetryPolicy::never()
            },
            n => config.sync.retry.with_max_attempts(n),
        };
    }
    if let Some(ms) = args.exponential_backoff_max_ms {
        config.sync.retry = config
            .sync
            .retry
            .with_exponential_backoff(Duration::from_millis(ms));
    }
    if let Some(ms) = args.stale_after_ms {
        config.sync.stale_after = Duration::from_millis(ms);
    }
    if !args.notices.is_empty() {
        config.notices = args.notices.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args).context("Invalid configuration")?;

    let target = if args.headless {
        LogTarget::Stderr
    } else {
        LogTarget::File(args.log_file.clone())
    };
    init_logging(&config.log_level, target)?;

    if args.headless {
        run_headless(config).await
    } else {
        run_terminal(config).await
    }
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Interactive terminal dashboard.
async fn run_terminal(config: DashboardConfig) -> Result<()> {
    install_restore_hook();
    let mut terminal = enter_terminal().context("Failed to set up terminal")?;

    let mut app = App::new(&config);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let mut client = LiveSyncClient::new(config.sync.clone(), event_tx);

    let run = match client.start() {
        Ok(()) => run_app(&mut terminal, &mut app, event_rx).await,
        Err(e) => Err(e.into()),
    };

    // No sync events after this point.
    client.stop().await;

    let restore = leave_terminal(&mut terminal).context("Failed to restore terminal");
    session_result(run, restore)
}

/// Leave raw mode and the alternate screen if a panic unwinds past the UI.
fn install_restore_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        previous(info);
    }));
}

fn enter_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn leave_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()
}

/// The run error wins; a restore failure only surfaces after a clean run.
fn session_result(run: Result<()>, restore: Result<()>) -> Result<()> {
    run.and(restore)
}

/// Main application loop.
async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut event_rx: mpsc::Receiver<SyncEvent>,
) -> Result<()> {
    loop {
        // Draw UI; staleness is re-derived on every frame
        terminal.draw(|frame| ui::render(frame, app))?;

        // Check for sync events (non-blocking)
        while let Ok(event) = event_rx.try_recv() {
            app.handle_sync_event(event);
        }

        handle_terminal_events(app, POLL_TIMEOUT)?;

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Handle terminal key events.
fn handle_terminal_events(app: &mut App, poll_timeout: Duration) -> Result<()> {
    if !event::poll(poll_timeout)? {
        return Ok(());
    }

    let Event::Key(key) = event::read()? else {
        return Ok(());
    };

    if key.kind != KeyEventKind::Press {
        return Ok(());
    }

    app.on_key(key.code);
    Ok(())
}

/// Print the dashboard as text whenever it changes.
async fn run_headless(config: DashboardConfig) -> Result<()> {
    let mut app = App::new(&config);

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let mut client = LiveSyncClient::new(config.sync.clone(), event_tx);
    client.start()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    // Staleness is time-driven, so re-check between events too.
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut last_printed: Option<String> = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = event_rx.recv() => match event {
                Some(event) => {
                    app.handle_sync_event(event);
                }
                // The sync task ended: the retry policy gave up.
                None => break,
            },
            _ = ticker.tick() => {}
        }

        let text = render_plain(&app.view(Instant::now()));
        if last_printed.as_deref() != Some(text.as_str()) {
            println!("{text}\n");
            last_printed = Some(text);
        }
    }

    client.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_session_result_keeps_run_error() {
        let err = session_result(Err(anyhow!("feed task failed")), Ok(())).unwrap_err();
        assert_eq!(err.to_string(), "feed task failed");

        let err = session_result(
            Err(anyhow!("feed task failed")),
            Err(anyhow!("restore failed")),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "feed task failed");
    }

    #[test]
    fn test_session_result_reports_restore_failure() {
        assert!(session_result(Ok(()), Ok(())).is_ok());
        let err = session_result(Ok(()), Err(anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "restore failed");
    }

    #[test]
    fn test_max_retries_zero_disables_reconnect() {
        let args = Args::parse_from(["seat-tui", "--max-retries", "0", "--retry-interval-ms", "250"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.sync.retry.delay_for(1), None);
        assert_eq!(config.sync.retry.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_ws_url_fails_at_startup() {
        let args = Args::parse_from(["seat-tui", "--ws-url", "ws://exa mple.org/ws"]);
        assert!(build_config(&args).is_err());
    }
}

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sessionwatch::session::{AlarmConfig, MonotonicTime, SessionController, SharedSession};
use sessionwatch::source::{DataSource, ReplaySource, StreamSource};
use sessionwatch::ui::{self, Theme};
use sessionwatch::{batch, config, events, App, Settings};

#[derive(Parser, Debug)]
#[command(name = "sessionwatch")]
#[command(about = "Terminal controller for timed measurement sessions with threshold alarms")]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connect to a measuring device streaming readings (host:port)
    #[arg(short, long, conflicts_with = "replay")]
    connect: Option<String>,

    /// Replay a recorded stream, one reading per line
    #[arg(long, conflicts_with = "connect")]
    replay: Option<PathBuf>,

    /// Subject metadata file included in exported reports
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Alarm mode: absolute, percent or difference (enables the alarm)
    #[arg(long)]
    alarm_mode: Option<String>,

    /// Alarm threshold (enables the alarm)
    #[arg(long)]
    alarm_threshold: Option<String>,

    /// Alarm message shown when the threshold is reached
    #[arg(long)]
    alarm_message: Option<String>,

    /// Elapsed-time refresh interval in milliseconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Directory reports are exported to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Replay headlessly and write the report to this file, then exit.
    /// A `.json` extension writes a JSON document instead of text.
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Spacing between replayed readings in milliseconds
    #[arg(long, default_value = "100")]
    sample_interval: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    apply_overrides(&mut settings, &args);
    init_logging(&settings)?;

    let alarm = match settings.alarm.to_alarm_config() {
        Ok(alarm) => alarm,
        Err(e) => {
            warn!(error = %e, "alarm configuration rejected, alarm disabled");
            AlarmConfig::default()
        }
    };

    let metadata = match args.metadata.as_deref() {
        Some(path) => Some(config::load_metadata(path)?),
        None => None,
    };

    let sample_interval = Duration::from_millis(args.sample_interval);

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        let replay = settings
            .stream
            .replay
            .as_deref()
            .context("--export needs a recording to replay")?;
        return export_replay(replay, export_path, sample_interval, alarm, metadata.as_ref());
    }

    // Build a tokio runtime for the transport and the refresh task
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let source: Box<dyn DataSource> = if let Some(ref path) = settings.stream.replay {
        Box::new(ReplaySource::new(path).with_interval(sample_interval))
    } else if let Some(ref addr) = settings.stream.connect {
        println!("Connecting to {}...", addr);
        let stream = rt
            .block_on(tokio::net::TcpStream::connect(addr.as_str()))
            .with_context(|| format!("Failed to connect to {}", addr))?;
        info!(addr = %addr, "connected");
        Box::new(StreamSource::connect(stream, addr))
    } else {
        bail!("No data source: pass --connect <host:port> or --replay <file>");
    };

    let controller = SessionController::new(Box::new(MonotonicTime), alarm);
    let (session, notifications) =
        SharedSession::with_notifications(controller, settings.display.refresh());

    let app = App::new(session.clone(), notifications, source, Theme::auto_detect())
        .with_metadata(metadata)
        .with_export_dir(settings.export.directory.clone());

    let result = run_tui(app);
    session.shutdown();
    result
}

/// CLI flags take precedence over file and environment settings.
fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(ref addr) = args.connect {
        settings.stream.connect = Some(addr.clone());
        settings.stream.replay = None;
    }
    if let Some(ref path) = args.replay {
        settings.stream.replay = Some(path.clone());
    }
    if let Some(ref mode) = args.alarm_mode {
        settings.alarm.mode = mode.clone();
        settings.alarm.enabled = true;
    }
    if let Some(ref threshold) = args.alarm_threshold {
        settings.alarm.threshold = Some(threshold.clone());
        settings.alarm.enabled = true;
    }
    if let Some(ref message) = args.alarm_message {
        settings.alarm.message = message.clone();
    }
    if let Some(ms) = args.refresh {
        settings.display.refresh_ms = ms;
    }
    if let Some(ref dir) = args.export_dir {
        settings.export.directory = dir.clone();
    }
    if let Some(ref file) = args.log_file {
        settings.log.file = file.clone();
    }
}

/// Log to a file; `RUST_LOG` overrides the configured level.
fn init_logging(settings: &Settings) -> Result<()> {
    let file = std::fs::File::create(&settings.log.file)
        .with_context(|| format!("Failed to open log file {}", settings.log.file.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Replay a recording without a terminal and write the report.
fn export_replay(
    replay: &Path,
    export_path: &Path,
    interval: Duration,
    alarm: AlarmConfig,
    metadata: Option<&sessionwatch::ReportMetadata>,
) -> Result<()> {
    if !replay.is_file() {
        bail!("Recording not found: {}", replay.display());
    }
    let mut source = ReplaySource::new(replay);
    let summary = batch::export_to_file(&mut source, export_path, interval, alarm, metadata)?;

    println!(
        "Exported {} samples ({} rejected) to {}",
        summary.accepted,
        summary.rejected,
        export_path.display()
    );
    if summary.alarm_fired {
        println!("Alarm fired during the session");
    }
    Ok(())
}

/// Run the TUI until the operator quits
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Pull frames before drawing so the chart is current
        app.pump();

        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered =
                    ratatui::layout::Rect::new(0, top, area.width, 5u16.min(area.height - top));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(8),    // Chart
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::chart::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            ui::common::render_alarm_banner(frame, app, chunks[1]);

            if app.confirm_reset {
                ui::dialog::render_confirm_reset(frame, app, area);
            }

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_without_replay_flag_parses() {
        // The recording may come from the config file instead
        let args = Args::try_parse_from(["sessionwatch", "--export", "out.txt"]).unwrap();
        assert_eq!(args.export, Some(PathBuf::from("out.txt")));
        assert!(args.replay.is_none());
    }

    #[test]
    fn test_config_replay_feeds_export() {
        let args =
            Args::try_parse_from(["sessionwatch", "--export", "out.json", "--alarm-mode", "pct"])
                .unwrap();
        let mut settings = Settings::default();
        settings.stream.replay = Some(PathBuf::from("recording.txt"));
        apply_overrides(&mut settings, &args);
        assert_eq!(settings.stream.replay, Some(PathBuf::from("recording.txt")));
        assert!(settings.alarm.enabled);
        assert_eq!(settings.alarm.mode, "pct");
    }
}

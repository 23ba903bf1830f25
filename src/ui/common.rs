//! Common UI components.
//!
//! This module contains the header bar, status bar, alarm banner and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::session::{AlarmConfig, AlarmMode, Phase};

/// Render the header bar with the session overview.
///
/// Displays: phase badge, initial and current values, elapsed time,
/// event count and alarm state.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.state();
    let alarm = app.session().alarm_config();

    let badge = match state.phase {
        Phase::Idle => "Idle",
        Phase::Running => "Active",
        Phase::Paused => "Paused",
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.phase_style(state.phase)),
        Span::styled(
            format!("{:<7}", badge),
            app.theme.phase_style(state.phase),
        ),
        Span::raw("│ "),
        Span::styled("Initial ", app.theme.label),
        Span::styled(
            format_value(state.initial_value),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled("Current ", app.theme.label),
        Span::styled(
            format_value(state.current_value),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled("Elapsed ", app.theme.label),
        Span::styled(
            app.elapsed_display(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled("Events ", app.theme.label),
        Span::raw(state.event_count.to_string()),
        Span::raw(" │ "),
        alarm_span(app, &alarm, state.alarm_fired, state.initial_value),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Format an optional reading for the header (`--` when unset).
pub fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{:.2}", v))
}

fn alarm_span<'a>(app: &App, alarm: &AlarmConfig, fired: bool, initial: Option<f64>) -> Span<'a> {
    if fired {
        return Span::styled(
            "ALARM FIRED",
            Style::default().fg(app.theme.alarm).add_modifier(Modifier::BOLD),
        );
    }
    if !alarm.enabled {
        return Span::styled("Alarm off", Style::default().add_modifier(Modifier::DIM));
    }
    match alarm.threshold {
        Some(threshold) => Span::raw(alarm_label(alarm.mode, threshold, initial)),
        None => Span::styled(
            "Alarm: invalid threshold",
            Style::default().fg(app.theme.paused),
        ),
    }
}

/// Header text for an armed alarm. Relative modes show the resolved level
/// once the initial value is known.
pub fn alarm_label(mode: AlarmMode, threshold: f64, initial: Option<f64>) -> String {
    let rule = match mode {
        AlarmMode::Absolute => return format!("Alarm ≤ {}", threshold),
        AlarmMode::PercentOfInitial => format!("{}% of initial", threshold),
        AlarmMode::AbsoluteDifference => format!("initial - {}", threshold),
    };
    match mode.trigger_level(threshold, initial) {
        Some(level) => format!("Alarm ≤ {:.2} ({})", level, rule),
        None => format!("Alarm ≤ {}", rule),
    }
}

/// Render the status bar at the bottom.
///
/// Shows: source description, available controls, temporary status
/// messages and transport errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.state().phase {
        Phase::Running => "space:pause m:mark r:reset e:export a:alarm ?:help q:quit",
        Phase::Paused => "space:resume r:reset e:export a:alarm ?:help q:quit",
        Phase::Idle => "space:start e:export a:alarm ?:help q:quit",
    };

    let status = if let Some(ref err) = app.transport_error {
        format!(" {} | Error: {} | {}", app.source_description(), err, controls)
    } else {
        format!(
            " {} | {} samples | {}",
            app.source_description(),
            app.state().sample_count,
            controls
        )
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the alarm banner in the top-right corner while it is live.
pub fn render_alarm_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(message) = app.get_alarm_banner() else {
        return;
    };

    let text = format!(" ⚠ {} ", message);
    let width = (text.chars().count() as u16 + 2).min(area.width);
    let banner_area = Rect::new(area.x + area.width - width, area.y + 1, width, 3);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.alarm));
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(app.theme.alarm).add_modifier(Modifier::BOLD))
        .block(block);

    frame.render_widget(Clear, banner_area);
    frame.render_widget(paragraph, banner_area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Session",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  space     Start / pause / resume"),
        Line::from("  m         Mark event"),
        Line::from("  r         Reset (asks first)"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  a         Toggle alarm"),
        Line::from("  e         Export report"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 16u16.min(area.height.saturating_sub(2));
    let help_area = centered(area, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// A `width` x `height` rectangle centered in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::session::Phase;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color of the measured series.
    pub series: Color,
    /// Color of event marker lines.
    pub marker: Color,
    /// Color of the alarm banner.
    pub alarm: Color,
    /// Color for a running session.
    pub running: Color,
    /// Color for a paused session.
    pub paused: Color,
    /// Color for borders and axes.
    pub border: Color,
    /// Style for labels in the header.
    pub label: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            series: Color::LightYellow,
            marker: Color::LightRed,
            alarm: Color::Red,
            running: Color::Green,
            paused: Color::Yellow,
            border: Color::Gray,
            label: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            series: Color::Rgb(0xd9, 0x6a, 0x1e),
            marker: Color::Red,
            alarm: Color::Red,
            running: Color::Green,
            paused: Color::Rgb(0xb5, 0x89, 0x00),
            border: Color::DarkGray,
            label: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a session phase
    pub fn phase_style(&self, phase: Phase) -> Style {
        match phase {
            Phase::Idle => Style::default().add_modifier(Modifier::DIM),
            Phase::Running => Style::default().fg(self.running).add_modifier(Modifier::BOLD),
            Phase::Paused => Style::default().fg(self.paused),
        }
    }
}

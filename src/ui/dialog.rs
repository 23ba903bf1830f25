//! Reset confirmation dialog.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::common::centered;

/// Render the yes/no prompt shown before a reset discards the session.
pub fn render_confirm_reset(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.state();
    let key = |color: Color| Style::default().fg(color).add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from(""),
        Line::from("Discard the current session?"),
        Line::from(Span::styled(
            format!(
                "{} samples and {} events will be lost.",
                state.sample_count, state.event_count
            ),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", key(app.theme.alarm)),
            Span::raw(": reset   "),
            Span::styled("n", key(app.theme.highlight)),
            Span::raw(": keep"),
        ]),
    ];

    let block = Block::default()
        .title(" Reset ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.alarm));

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(block);

    let width = 44u16.min(area.width.saturating_sub(4));
    let height = 7u16.min(area.height.saturating_sub(2));
    let dialog_area = centered(area, width, height);

    frame.render_widget(Clear, dialog_area);
    frame.render_widget(paragraph, dialog_area);
}

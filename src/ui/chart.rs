//! Live line chart of the session's samples with event markers.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::PlotData;

/// Render the chart into `area`.
///
/// Samples are drawn as a braille line; each event marker is a vertical
/// line labelled `#n` in the legend.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Measurements ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.plot.is_empty() {
        let hint = Paragraph::new("No data yet. Press space to start measuring.")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let x_bounds = app.plot.x_bounds();
    let y_bounds = app.plot.y_bounds();

    // Marker lines must outlive the datasets that borrow them
    let marker_lines: Vec<(String, [(f64, f64); 2])> = app
        .plot
        .markers
        .iter()
        .map(|m| (m.label(), PlotData::marker_line(m, y_bounds)))
        .collect();

    let mut datasets = vec![Dataset::default()
        .name("value")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.series))
        .data(&app.plot.points)];

    for (label, line) in &marker_lines {
        datasets.push(
            Dataset::default()
                .name(label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.marker))
                .data(line),
        );
    }

    let axis_style = Style::default().fg(app.theme.border);
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Time (s)")
                .style(axis_style)
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, 1)),
        )
        .y_axis(
            Axis::default()
                .title("Value")
                .style(axis_style)
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, 2)),
        );

    frame.render_widget(chart, area);
}

/// Low, middle and high tick labels for an axis.
fn axis_labels(bounds: [f64; 2], precision: usize) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(format!("{:.*}", precision, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_labels() {
        let labels = axis_labels([0.0, 10.0], 1);
        let text: Vec<String> = labels.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, vec!["0.0", "5.0", "10.0"]);
    }
}

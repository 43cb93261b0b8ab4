use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Record, ReviewStatus};

/// Width of the column-name gutter in the record card.
const LABEL_WIDTH: usize = 16;

/// Label and colour used to show a building's review state.
pub(crate) fn status_badge(status: Option<&ReviewStatus>) -> Span<'static> {
    match status {
        Some(ReviewStatus::Validated) => Span::styled(
            ReviewStatus::Validated.label().to_string(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Some(ReviewStatus::Rejected) => Span::styled(
            ReviewStatus::Rejected.label().to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Some(ReviewStatus::Other(label)) => {
            Span::styled(label.clone(), Style::default().fg(Color::Yellow))
        }
        None => Span::styled("Non évalué", Style::default().fg(Color::DarkGray)),
    }
}

/// One `column  value` line per record field.
pub(crate) fn record_lines(record: &Record) -> Vec<Line<'static>> {
    let label_style = Style::default().fg(Color::Gray);
    Record::COLUMNS
        .iter()
        .zip(record.values())
        .map(|(column, value)| {
            let shown = if value.trim().is_empty() {
                "-".to_string()
            } else {
                value
            };
            Line::from(vec![
                Span::styled(format!("{column:<LABEL_WIDTH$}"), label_style),
                Span::raw(shown),
            ])
        })
        .collect()
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

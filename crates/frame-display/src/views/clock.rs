//! Clock screen: time over date, centred. No network.

use chrono::{DateTime, FixedOffset};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use frame_proto::clock::clock_strings;

use crate::theme::{style_heading, style_secondary};

pub fn draw(frame: &mut Frame, now: &DateTime<FixedOffset>) {
    let area = frame.area();
    super::clear(frame, area);

    let (time, date) = clock_strings(now);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(time, style_heading()))).alignment(Alignment::Center),
        rows[1],
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(date, style_secondary()))).alignment(Alignment::Center),
        rows[3],
    );
}

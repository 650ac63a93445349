//! Recent tracks screen.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use frame_proto::track::Track;

use crate::theme::{
    style_accent, style_default, style_heading, style_muted, style_playing, style_secondary,
};

/// Rows listed, whatever the cache holds.
pub const MAX_ROWS: usize = 4;
const ARTIST_MAX_CHARS: usize = 30;
const TITLE_MAX_CHARS: usize = 35;

/// Bar heights of the footer waveform, out of 8.
const WAVEFORM: [usize; 5] = [3, 7, 4, 8, 2];
const BARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const HINT: &str = "Tap to cycle modes";
const ATTRIBUTION: &str = " via last.fm";

pub fn draw(frame: &mut Frame, tracks: &[Track]) {
    let area = frame.area();
    super::clear(frame, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let block = Block::default().padding(Padding::horizontal(1));
    let heading = Paragraph::new(Line::from(Span::styled("Recent Tracks", style_heading())))
        .block(block.clone());
    frame.render_widget(heading, rows[0]);
    frame.render_widget(Paragraph::new(track_lines(tracks)).block(block), rows[1]);
    draw_footer(frame, rows[2]);
}

fn track_lines(tracks: &[Track]) -> Vec<Line<'static>> {
    if tracks.is_empty() {
        return vec![Line::from(Span::styled("No recent tracks", style_secondary()))];
    }

    let mut lines = Vec::new();
    for (i, track) in tracks.iter().take(MAX_ROWS).enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{}. ", i + 1), style_muted()),
            Span::styled(truncate(&track.artist, ARTIST_MAX_CHARS), style_default()),
        ]));
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(truncate(&track.name, TITLE_MAX_CHARS), style_secondary()),
        ]));
        if track.now_playing {
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled("NOW PLAYING", style_playing()),
            ]));
        }
        lines.push(Line::default());
    }
    lines
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let wave = waveform();
    let right_width = (wave.as_str().width() + ATTRIBUTION.width()) as u16;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right_width + 1)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Span::styled(HINT, style_muted())).block(Block::default().padding(Padding::left(1))),
        cols[0],
    );
    let attribution = Line::from(vec![
        Span::styled(wave, style_accent()),
        Span::styled(ATTRIBUTION, style_muted()),
    ]);
    frame.render_widget(
        Paragraph::new(attribution)
            .alignment(Alignment::Right)
            .block(Block::default().padding(Padding::right(1))),
        cols[1],
    );
}

fn waveform() -> String {
    WAVEFORM.iter().map(|&h| BARS[h.min(8)]).collect()
}

/// Cut `text` to `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

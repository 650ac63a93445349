//! Album screen: artwork as half-block pixels above a caption strip.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph},
    Frame,
};

use frame_proto::artwork::Artwork;
use frame_proto::track::Track;

use crate::theme::{style_background, style_heading, style_muted, style_secondary};

/// Rows reserved at the bottom for artist and title.
pub const CAPTION_ROWS: u16 = 3;

pub fn draw(frame: &mut Frame, art: Option<&Artwork>, track: Option<&Track>) {
    let area = frame.area();
    super::clear(frame, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(CAPTION_ROWS)])
        .split(area);

    if let Some(art) = art {
        draw_art(frame, rows[0], art);
    }
    if let Some(track) = track {
        draw_caption(frame, rows[1], track);
    }
}

/// Shown before the first successful refresh.
pub fn draw_placeholder(frame: &mut Frame) {
    let area = frame.area();
    super::clear(frame, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    let lines = vec![
        Line::from(Span::styled("♪", style_secondary())),
        Line::default(),
        Line::from(Span::styled("Nothing played yet", style_muted())),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), rows[1]);
}

fn draw_art(frame: &mut Frame, area: Rect, art: &Artwork) {
    let lines = art_lines(art, area.width as u32, area.height as u32 * 2);
    let padding_top = (area.height as usize).saturating_sub(lines.len()) / 2;

    let mut padded = vec![Line::default(); padding_top];
    padded.extend(lines);
    frame.render_widget(Paragraph::new(padded).alignment(Alignment::Center), area);
}

fn draw_caption(frame: &mut Frame, area: Rect, track: &Track) {
    let lines = vec![
        Line::from(Span::styled(track.artist.clone(), style_heading())),
        Line::from(Span::styled(track.name.clone(), style_secondary())),
    ];
    let block = Block::default()
        .style(style_background())
        .padding(Padding::new(2, 2, 1, 0));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Scale `art` to fit `max_w` × `max_h` pixels and emit one line per pixel
/// pair: `▀` with the upper pixel as foreground, the lower as background.
pub fn art_lines(art: &Artwork, max_w: u32, max_h: u32) -> Vec<Line<'static>> {
    if max_w == 0 || max_h == 0 || art.width() == 0 || art.height() == 0 {
        return Vec::new();
    }
    let Some(source) = RgbImage::from_raw(art.width(), art.height(), art.as_rgb().to_vec()) else {
        return Vec::new();
    };

    let (w, h) = fit(art.width(), art.height(), max_w, max_h);
    let image = if (w, h) == source.dimensions() {
        source
    } else {
        imageops::resize(&source, w, h, FilterType::Triangle)
    };

    (0..h)
        .step_by(2)
        .map(|y| {
            let spans: Vec<Span<'static>> = (0..w)
                .map(|x| {
                    let top = image.get_pixel(x, y).0;
                    let bottom = if y + 1 < h {
                        image.get_pixel(x, y + 1).0
                    } else {
                        top
                    };
                    Span::styled("▀", Style::default().fg(rgb(top)).bg(rgb(bottom)))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Largest size with the source aspect ratio inside `max_w` × `max_h`.
fn fit(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let (w, h, max_w, max_h) = (w as u64, h as u64, max_w as u64, max_h as u64);
    let (fw, fh) = if max_w * h <= max_h * w {
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };
    (fw.max(1) as u32, fh.max(1) as u32)
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

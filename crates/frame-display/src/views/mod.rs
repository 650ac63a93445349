//! Pure draw functions, one module per screen. Every function composes the
//! whole frame so the result never depends on what was on screen before.

pub mod album;
pub mod clock;
pub mod recent;

use ratatui::{
    layout::Rect,
    widgets::{Block, Clear},
    Frame,
};

use crate::theme::style_background;

fn clear(frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(style_background()), area);
}

#[cfg(test)]
pub(crate) fn render_lines(width: u16, height: u16, draw: impl FnOnce(&mut Frame)) -> Vec<String> {
    use ratatui::{backend::TestBackend, Terminal};

    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(draw).unwrap();
    let buffer = terminal.backend().buffer();
    (0..height)
        .map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect::<String>())
        .collect()
}

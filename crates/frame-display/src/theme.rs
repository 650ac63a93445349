//! Color palette and style constants for the frame's screens.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(0, 0, 0);
pub const C_PRIMARY: Color = Color::Rgb(255, 255, 255);
pub const C_SECONDARY: Color = Color::Rgb(170, 170, 170);
pub const C_MUTED: Color = Color::Rgb(100, 100, 100);
pub const C_ACCENT: Color = Color::Rgb(213, 16, 7); // last.fm red
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);

/// Fill painted outside the rounded artwork corners; matches the background.
pub const CORNER_FILL: [u8; 3] = [0, 0, 0];

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_background() -> Style {
    Style::default().bg(C_BG)
}

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_heading() -> Style {
    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_accent() -> Style {
    Style::default().fg(C_ACCENT)
}

pub fn style_playing() -> Style {
    Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD)
}

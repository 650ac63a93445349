//! Terminal input as a touch surface.
//!
//! A left/right/middle mouse press is contact until the matching release.
//! Space, Enter and `t` start a contact that lasts until the key is released.
//! Most terminals never report key releases, only auto-repeat presses, so a
//! key contact also ends once no repeat has arrived for `KEY_REPEAT_GAP`.
//! `q`, Esc and Ctrl-C close the surface.

use std::time::Duration;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use tokio::time::Instant;
use tracing::debug;

use frame_proto::touch::{TouchError, TouchSurface};

/// Longer than the usual auto-repeat delay (250-660 ms), so repeats from a
/// held key keep extending the same contact.
const KEY_REPEAT_GAP: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Tap,
    /// A tap key went up (only on terminals that report releases).
    Lift,
    Quit,
    Ignore,
}

fn is_tap_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('t'))
}

fn classify(key: &KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return if is_tap_key(key.code) {
            KeyAction::Lift
        } else {
            KeyAction::Ignore
        };
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        code if is_tap_key(code) => KeyAction::Tap,
        _ => KeyAction::Ignore,
    }
}

#[derive(Debug, Default)]
pub struct TerminalTouch {
    button_down: bool,
    /// End of the current key contact unless another repeat arrives first.
    key_held_until: Option<Instant>,
}

impl TerminalTouch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one input event into the contact state. Returns true when the
    /// event itself is a contact (so a press and release drained in the same
    /// poll still count).
    fn apply(&mut self, event: Event, now: Instant) -> Result<bool, TouchError> {
        match event {
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(_) => {
                    self.button_down = true;
                    Ok(true)
                }
                MouseEventKind::Up(_) => {
                    self.button_down = false;
                    Ok(false)
                }
                _ => Ok(false),
            },
            Event::Key(key) => match classify(&key) {
                KeyAction::Tap => {
                    self.key_held_until = Some(now + KEY_REPEAT_GAP);
                    Ok(true)
                }
                KeyAction::Lift => {
                    self.key_held_until = None;
                    Ok(false)
                }
                KeyAction::Quit => {
                    debug!("[touch] quit key {:?}", key.code);
                    Err(TouchError::Closed)
                }
                KeyAction::Ignore => Ok(false),
            },
            _ => Ok(false),
        }
    }

    fn held(&self, now: Instant) -> bool {
        self.button_down || self.key_held_until.is_some_and(|until| now < until)
    }
}

impl TouchSurface for TerminalTouch {
    fn poll(&mut self) -> Result<bool, TouchError> {
        let now = Instant::now();
        let mut contact = false;
        while event::poll(Duration::ZERO)? {
            contact |= self.apply(event::read()?, now)?;
        }
        Ok(contact || self.held(now))
    }

    fn reset(&mut self) {
        self.button_down = false;
        self.key_held_until = None;
    }
}

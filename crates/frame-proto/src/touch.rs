//! Debounced tap detection over a raw contact surface.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::TouchConfig;

#[derive(Debug, thiserror::Error)]
pub enum TouchError {
    /// The surface went away (window closed, quit requested).
    #[error("touch surface closed")]
    Closed,
    #[error("touch surface I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw contact-state polling.
pub trait TouchSurface {
    /// Read pending input and report whether the surface is currently touched.
    fn poll(&mut self) -> Result<bool, TouchError>;

    /// Forget any latched contact. Called when a release never arrived.
    fn reset(&mut self) {}
}

/// Turns a contact into exactly one tap: once contact is seen, waits for
/// release before reporting it.
pub struct TouchInput<T> {
    surface: T,
    release_poll: Duration,
    release_timeout: Duration,
}

impl<T: TouchSurface> TouchInput<T> {
    pub fn new(surface: T, config: &TouchConfig) -> Self {
        Self {
            surface,
            release_poll: Duration::from_millis(config.release_poll_ms),
            release_timeout: Duration::from_secs(config.release_timeout_secs),
        }
    }

    pub fn surface(&self) -> &T {
        &self.surface
    }

    pub async fn poll_tap(&mut self) -> Result<bool, TouchError> {
        if !self.surface.poll()? {
            return Ok(false);
        }

        debug!("[touch] contact");
        let started = Instant::now();
        while self.surface.poll()? {
            if started.elapsed() >= self.release_timeout {
                warn!("[touch] no release after {:?}, treating as released", self.release_timeout);
                self.surface.reset();
                break;
            }
            tokio::time::sleep(self.release_poll).await;
        }
        Ok(true)
    }
}

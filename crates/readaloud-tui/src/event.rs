use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEventKind};

/// Event handler for terminal events
pub struct EventHandler {
    tick_rate: Duration,
}

/// Result of an async document load
pub enum SourceEvent {
    /// Document text is available
    Loaded(String),
    /// Document could not be read
    Failed(String),
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms.max(1)),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Poll for the next event, waiting no longer than `timeout` (capped at the tick rate)
    pub fn next_within(&self, timeout: Duration) -> Result<Option<AppEvent>> {
        if event::poll(timeout.min(self.tick_rate))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events, ignore release events
                    // (crossterm 0.27+ sends release events on some systems)
                    if key.kind == KeyEventKind::Press {
                        Ok(Some(AppEvent::Key(key)))
                    } else {
                        Ok(None)
                    }
                }
                Event::Mouse(mouse) => Ok(match mouse.kind {
                    MouseEventKind::ScrollDown => Some(AppEvent::Wheel { down: true }),
                    MouseEventKind::ScrollUp => Some(AppEvent::Wheel { down: false }),
                    MouseEventKind::Drag(_) => Some(AppEvent::Drag { row: mouse.row }),
                    MouseEventKind::Up(_) => Some(AppEvent::Release),
                    _ => None,
                }),
                Event::Resize(w, h) => Ok(Some(AppEvent::Resize(w, h))),
                _ => Ok(None),
            }
        } else {
            Ok(Some(AppEvent::Tick))
        }
    }
}

/// Application events
#[derive(Debug)]
pub enum AppEvent {
    /// A key was pressed
    Key(KeyEvent),
    /// Mouse wheel turned
    Wheel { down: bool },
    /// Mouse moved with a button held
    Drag { row: u16 },
    /// Mouse button released
    Release,
    /// Terminal was resized
    Resize(u16, u16),
    /// Tick event for periodic updates
    Tick,
}

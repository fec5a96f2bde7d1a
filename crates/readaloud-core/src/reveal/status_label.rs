use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::revealer::IncrementalRevealer;
use super::timing::interval_from_millis;
use super::tokens::Granularity;
use crate::config::LabelConfig;

/// Borrowed view of the caption animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelState<'a> {
    pub target_word: &'a str,
    pub revealed_chars: usize,
}

/// Animates the status caption one character at a time
///
/// The caption follows a single "busy" flag: whenever it flips, the
/// animation restarts from an empty caption with the matching text.
#[derive(Debug, Clone)]
pub struct StatusLabelAnimator {
    revealer: IncrementalRevealer,
    busy_text: Arc<str>,
    idle_text: Arc<str>,
    busy: Option<bool>,
}

impl Default for StatusLabelAnimator {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}

impl StatusLabelAnimator {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(70);

    pub fn new(busy_text: &str, idle_text: &str, interval: Duration) -> Self {
        Self {
            revealer: IncrementalRevealer::new(Granularity::Char, interval),
            busy_text: Arc::from(busy_text),
            idle_text: Arc::from(idle_text),
            busy: None,
        }
    }

    pub fn from_config(config: &LabelConfig) -> Self {
        Self::new(
            &config.busy_text,
            &config.idle_text,
            interval_from_millis(config.char_interval_ms),
        )
    }

    /// Update the busy flag; restarts the animation only when it flips
    ///
    /// Returns true when a new animation was started.
    pub fn set_busy(&mut self, busy: bool, now: Instant) -> bool {
        if self.busy == Some(busy) {
            return false;
        }
        self.busy = Some(busy);

        let target = if busy { &self.busy_text } else { &self.idle_text };
        self.revealer.clear();
        self.revealer.start(Arc::clone(target), now);
        debug!(busy, caption = %target, "Status caption restarted");
        true
    }

    /// Advance the animation; returns true when the caption changed
    pub fn update(&mut self, now: Instant) -> bool {
        !self.revealer.poll(now).is_empty()
    }

    /// Caption text visible right now
    pub fn label(&self) -> &str {
        self.revealer.revealed()
    }

    pub fn state(&self) -> LabelState<'_> {
        LabelState {
            target_word: self.revealer.source(),
            revealed_chars: self.revealer.cursor(),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.revealer.is_active()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.revealer.next_deadline()
    }

    /// Stop animating, leaving the caption as it is
    pub fn teardown(&mut self) {
        self.revealer.cancel();
    }
}

//! L3 Molecular Layer: Timer-driven incremental revealer
//!
//! Combines token boundaries and interval arithmetic into a cancellable
//! reveal timer. The host calls `poll()` with the current time; every tick
//! that has come due produces a `RevealFrame` carrying the full prefix.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::timing::{due_ticks, MIN_INTERVAL};
use super::tokens::{token_boundaries, Granularity};

/// Identifies one `start()` of a revealer. Increases with every start.
pub type Generation = u64;

/// Snapshot emitted on every reveal tick
#[derive(Debug, Clone)]
pub struct RevealFrame {
    /// Reveal this frame belongs to
    pub generation: Generation,
    /// Byte length of the revealed prefix
    pub revealed_len: usize,
    /// Whether this tick revealed the final token
    pub complete: bool,
    source: Arc<str>,
}

impl RevealFrame {
    /// The full revealed prefix at this tick
    pub fn prefix(&self) -> &str {
        &self.source[..self.revealed_len]
    }

    /// The complete text being revealed
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }
}

/// Running timer state
#[derive(Debug, Clone, Copy)]
struct ActiveTimer {
    /// When the next token is due
    next_due: Instant,
}

/// Reveals a text token by token on a fixed interval
///
/// At most one timer is live per revealer: `start()` always cancels the
/// previous one before resetting.
#[derive(Debug, Clone)]
pub struct IncrementalRevealer {
    granularity: Granularity,
    interval: Duration,
    source: Arc<str>,
    boundaries: Vec<usize>,
    cursor: usize,
    timer: Option<ActiveTimer>,
    generation: Generation,
}

impl IncrementalRevealer {
    pub fn new(granularity: Granularity, interval: Duration) -> Self {
        Self {
            granularity,
            interval: interval.max(MIN_INTERVAL),
            source: Arc::from(""),
            boundaries: Vec::new(),
            cursor: 0,
            timer: None,
            generation: 0,
        }
    }

    /// Begin revealing `text`, replacing any reveal in progress
    ///
    /// Text without a single token is ignored: no timer starts and the
    /// current state is left untouched.
    pub fn start(&mut self, text: Arc<str>, now: Instant) -> Option<Generation> {
        let boundaries = token_boundaries(&text, self.granularity);
        if boundaries.is_empty() {
            return None;
        }

        self.cancel();
        self.generation += 1;
        self.source = text;
        self.boundaries = boundaries;
        self.cursor = 0;
        self.timer = Some(ActiveTimer {
            next_due: now + self.interval,
        });

        Some(self.generation)
    }

    /// Stop the timer, keeping whatever prefix has been revealed
    ///
    /// Returns false when nothing was running.
    pub fn cancel(&mut self) -> bool {
        self.timer.take().is_some()
    }

    /// Cancel and forget the current text entirely
    pub fn clear(&mut self) {
        self.cancel();
        self.source = Arc::from("");
        self.boundaries.clear();
        self.cursor = 0;
    }

    /// Advance by every tick that has come due by `now`
    pub fn poll(&mut self, now: Instant) -> Vec<RevealFrame> {
        let Some(timer) = self.timer else {
            return Vec::new();
        };

        let due = due_ticks(timer.next_due, now, self.interval);
        let mut frames = Vec::with_capacity(due.min(64) as usize);

        for _ in 0..due {
            frames.push(self.advance());
            if self.timer.is_none() {
                break;
            }
        }

        if let Some(timer) = self.timer.as_mut() {
            timer.next_due += self.interval * due;
        }

        frames
    }

    fn advance(&mut self) -> RevealFrame {
        self.cursor = (self.cursor + 1).min(self.boundaries.len());
        let complete = self.cursor == self.boundaries.len();
        if complete {
            self.timer = None;
        }
        self.frame(complete)
    }

    fn frame(&self, complete: bool) -> RevealFrame {
        RevealFrame {
            generation: self.generation,
            revealed_len: self.revealed_len(),
            complete,
            source: Arc::clone(&self.source),
        }
    }

    /// Whether a reveal timer is running
    #[inline]
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether every token of the current text has been revealed
    pub fn is_complete(&self) -> bool {
        !self.boundaries.is_empty() && self.cursor == self.boundaries.len()
    }

    /// When the next tick is due, if a timer is running
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.next_due)
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Index of the next token to reveal
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn token_count(&self) -> usize {
        self.boundaries.len()
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    fn revealed_len(&self) -> usize {
        match self.cursor {
            0 => 0,
            n => self.boundaries[n - 1],
        }
    }

    /// Currently revealed prefix
    pub fn revealed(&self) -> &str {
        &self.source[..self.revealed_len()]
    }
}

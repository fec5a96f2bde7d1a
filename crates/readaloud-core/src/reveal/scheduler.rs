use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::revealer::{Generation, IncrementalRevealer, RevealFrame};
use super::timing::interval_from_millis;
use super::tokens::Granularity;
use crate::config::RevealConfig;

/// Events produced by the body text reveal
#[derive(Debug, Clone)]
pub enum RevealEvent {
    /// A new reveal began; the visible prefix is empty
    Started { generation: Generation },
    /// One more word is visible
    Tick(RevealFrame),
    /// The whole text is visible. Fires once per generation.
    Completed { generation: Generation },
}

/// Borrowed view of the reveal state
#[derive(Debug, Clone, Copy)]
pub struct RevealState<'a> {
    pub source_text: &'a str,
    pub revealed_prefix: &'a str,
    pub token_cursor: usize,
    pub active: bool,
}

/// Word-by-word "typewriter" reveal of the document text
#[derive(Debug, Clone)]
pub struct RevealScheduler {
    revealer: IncrementalRevealer,
    pending: Vec<RevealEvent>,
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

impl RevealScheduler {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(40);

    pub fn new(interval: Duration) -> Self {
        Self {
            revealer: IncrementalRevealer::new(Granularity::Word, interval),
            pending: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RevealConfig) -> Self {
        Self::new(interval_from_millis(config.word_interval_ms))
    }

    /// Cancel any reveal in flight and start revealing `text`
    ///
    /// Empty text is ignored and returns `None`.
    pub fn start(&mut self, text: Arc<str>, now: Instant) -> Option<Generation> {
        let generation = self.revealer.start(text, now)?;
        // Undelivered events of the previous reveal are stale now
        self.pending.clear();
        self.pending.push(RevealEvent::Started { generation });
        debug!(
            generation,
            words = self.revealer.token_count(),
            "Reveal started"
        );
        Some(generation)
    }

    /// Stop revealing, keeping the current prefix. Idempotent.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.revealer.cancel();
        if cancelled {
            debug!(
                generation = self.revealer.generation(),
                revealed = self.revealer.cursor(),
                "Reveal cancelled"
            );
        }
        cancelled
    }

    /// Advance the reveal to `now` and return events in issuance order
    pub fn update(&mut self, now: Instant) -> Vec<RevealEvent> {
        let mut events = std::mem::take(&mut self.pending);

        for frame in self.revealer.poll(now) {
            let completed = frame.complete.then_some(frame.generation);
            events.push(RevealEvent::Tick(frame));
            if let Some(generation) = completed {
                debug!(generation, "Reveal complete");
                events.push(RevealEvent::Completed { generation });
            }
        }

        events
    }

    pub fn state(&self) -> RevealState<'_> {
        RevealState {
            source_text: self.revealer.source(),
            revealed_prefix: self.revealer.revealed(),
            token_cursor: self.revealer.cursor(),
            active: self.revealer.is_active(),
        }
    }

    #[inline]
    pub fn revealed(&self) -> &str {
        self.revealer.revealed()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.revealer.is_active()
    }

    pub fn is_complete(&self) -> bool {
        self.revealer.is_complete()
    }

    pub fn generation(&self) -> Generation {
        self.revealer.generation()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.revealer.next_deadline()
    }

    /// (revealed, total) word counts for progress display
    pub fn progress(&self) -> (usize, usize) {
        (self.revealer.cursor(), self.revealer.token_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = RevealScheduler::DEFAULT_INTERVAL;

    fn completions(events: &[RevealEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, RevealEvent::Completed { .. }))
            .count()
    }

    #[test]
    fn test_three_words_three_ticks() {
        let start = Instant::now();
        let mut scheduler = RevealScheduler::with_defaults();
        scheduler.start(Arc::from("a b c"), start);

        let mut events = Vec::new();
        for k in 1..=3 {
            events.extend(scheduler.update(start + TICK * k));
        }

        assert!(matches!(events[0], RevealEvent::Started { generation: 1 }));
        assert_eq!(scheduler.revealed(), "a b c");
        assert_eq!(completions(&events), 1);
        assert!(matches!(events.last(), Some(RevealEvent::Completed { generation: 1 })));

        // No further completion once finished
        assert!(scheduler.update(start + TICK * 10).is_empty());
    }

    #[test]
    fn test_restart_converges_to_new_text() {
        let start = Instant::now();
        let mut scheduler = RevealScheduler::with_defaults();
        let long_text = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do";
        scheduler.start(Arc::from(long_text), start);
        scheduler.update(start + TICK * 3);

        scheduler.start(Arc::from("ok"), start + TICK * 3);
        let mut prefixes = Vec::new();
        for k in 4..=40 {
            for event in scheduler.update(start + TICK * k) {
                if let RevealEvent::Tick(frame) = event {
                    prefixes.push(frame.prefix().to_string());
                }
            }
        }

        assert_eq!(prefixes, vec!["ok".to_string()]);
        assert_eq!(scheduler.revealed(), "ok");
    }

    #[test]
    fn test_cancel_at_tick_k() {
        let start = Instant::now();
        let mut scheduler = RevealScheduler::with_defaults();
        scheduler.start(Arc::from("one two three four five"), start);
        scheduler.update(start + TICK * 2);

        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        assert!(scheduler.update(start + TICK * 20).is_empty());

        let state = scheduler.state();
        assert_eq!(state.revealed_prefix, "one two");
        assert_eq!(state.token_cursor, 2);
        assert!(!state.active);
    }

    #[test]
    fn test_empty_start_leaves_state() {
        let start = Instant::now();
        let mut scheduler = RevealScheduler::with_defaults();
        assert!(scheduler.start(Arc::from(""), start).is_none());
        assert!(scheduler.update(start + TICK).is_empty());
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.generation(), 0);
    }

    #[test]
    fn test_from_config_interval() {
        let config = RevealConfig {
            word_interval_ms: 5,
            ..Default::default()
        };
        let start = Instant::now();
        let mut scheduler = RevealScheduler::from_config(&config);
        scheduler.start(Arc::from("x y"), start);
        scheduler.update(start + Duration::from_millis(10));
        assert_eq!(scheduler.revealed(), "x y");
    }
}

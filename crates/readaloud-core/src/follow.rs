//! Follow mode: keeps a viewport pinned to freshly revealed text until the
//! user scrolls by hand.

use tracing::debug;

use crate::reveal::{Generation, RevealFrame};

/// A scrollable surface showing the revealed text
pub trait Viewport {
    /// Largest valid scroll offset for the current content
    fn max_offset(&self) -> u16;

    /// Current scroll offset
    fn offset(&self) -> u16;

    /// Move the scroll offset to `max_offset()`
    fn scroll_to_max(&mut self);

    /// The visible content grew to `content`. Must not move the offset
    /// except to keep it within bounds.
    fn observe_content(&mut self, content: &str);
}

/// User-originated scroll gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportInput {
    Wheel,
    TouchMove,
}

/// Pins an attached viewport to the bottom on every reveal tick
///
/// Following is enabled anew for every reveal generation and switched off
/// for the rest of that generation by the first manual scroll gesture.
#[derive(Debug)]
pub struct ScrollFollower<V> {
    viewport: Option<V>,
    follow_enabled: bool,
    follow_on_start: bool,
    generation: Option<Generation>,
}

impl<V: Viewport> Default for ScrollFollower<V> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<V: Viewport> ScrollFollower<V> {
    pub fn new(follow_on_start: bool) -> Self {
        Self {
            viewport: None,
            follow_enabled: follow_on_start,
            follow_on_start,
            generation: None,
        }
    }

    /// Attach a viewport, returning the one it replaces
    pub fn attach(&mut self, viewport: V) -> Option<V> {
        self.viewport.replace(viewport)
    }

    /// Detach the viewport. Ticks and input are ignored until reattached.
    pub fn detach(&mut self) -> Option<V> {
        self.viewport.take()
    }

    pub fn viewport(&self) -> Option<&V> {
        self.viewport.as_ref()
    }

    pub fn viewport_mut(&mut self) -> Option<&mut V> {
        self.viewport.as_mut()
    }

    /// A new reveal started: follow it from the top
    pub fn reset(&mut self, generation: Generation) {
        self.generation = Some(generation);
        self.follow_enabled = self.follow_on_start;
    }

    /// Observe a reveal tick. Returns true when the viewport was pinned.
    pub fn on_tick(&mut self, frame: &RevealFrame) -> bool {
        if self.generation != Some(frame.generation) {
            return false;
        }
        let Some(viewport) = self.viewport.as_mut() else {
            return false;
        };

        viewport.observe_content(frame.prefix());
        if !self.follow_enabled {
            return false;
        }
        viewport.scroll_to_max();
        true
    }

    /// Observe a manual scroll gesture. Returns true when it turned following off.
    pub fn on_input(&mut self, input: ViewportInput) -> bool {
        if self.viewport.is_none() || !self.follow_enabled {
            return false;
        }
        self.follow_enabled = false;
        debug!(?input, generation = ?self.generation, "Follow mode released by user scroll");
        true
    }

    #[inline]
    pub fn is_following(&self) -> bool {
        self.follow_enabled
    }

    pub fn is_attached(&self) -> bool {
        self.viewport.is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reveal::{RevealEvent, RevealScheduler};
    use std::sync::Arc;
    use std::time::Instant;

    /// One line per word, three visible rows
    #[derive(Debug, Default)]
    pub(crate) struct LineViewport {
        pub lines: u16,
        pub offset: u16,
        pub pins: usize,
    }

    impl Viewport for LineViewport {
        fn max_offset(&self) -> u16 {
            self.lines.saturating_sub(3)
        }

        fn offset(&self) -> u16 {
            self.offset
        }

        fn scroll_to_max(&mut self) {
            self.pins += 1;
            self.offset = self.max_offset();
        }

        fn observe_content(&mut self, content: &str) {
            self.lines = content.split_whitespace().count() as u16;
            self.offset = self.offset.min(self.max_offset());
        }
    }

    fn run(
        scheduler: &mut RevealScheduler,
        follower: &mut ScrollFollower<LineViewport>,
        at: Instant,
    ) {
        for event in scheduler.update(at) {
            if let RevealEvent::Tick(frame) = event {
                follower.on_tick(&frame);
            }
        }
    }

    #[test]
    fn test_ticks_pin_to_bottom() {
        let start = Instant::now();
        let tick = RevealScheduler::DEFAULT_INTERVAL;
        let mut scheduler = RevealScheduler::with_defaults();
        let mut follower = ScrollFollower::default();
        follower.attach(LineViewport::default());

        let generation = scheduler.start(Arc::from("a b c d e f"), start).unwrap();
        follower.reset(generation);

        for k in 1..=6 {
            run(&mut scheduler, &mut follower, start + tick * k);
            let viewport = follower.viewport().unwrap();
            assert_eq!(viewport.offset(), viewport.max_offset());
        }
        assert_eq!(follower.viewport().unwrap().offset(), 3);
    }

    #[test]
    fn test_wheel_stops_following_for_generation() {
        let start = Instant::now();
        let tick = RevealScheduler::DEFAULT_INTERVAL;
        let mut scheduler = RevealScheduler::with_defaults();
        let mut follower = ScrollFollower::default();
        follower.attach(LineViewport::default());

        let generation = scheduler.start(Arc::from("a b c d e f g h"), start).unwrap();
        follower.reset(generation);
        run(&mut scheduler, &mut follower, start + tick * 4);
        let pinned_at = follower.viewport().unwrap().offset();
        assert_eq!(pinned_at, 1);

        assert!(follower.on_input(ViewportInput::Wheel));
        assert!(!follower.on_input(ViewportInput::TouchMove));

        for k in 5..=8 {
            run(&mut scheduler, &mut follower, start + tick * k);
            assert_eq!(follower.viewport().unwrap().offset(), pinned_at);
        }
        assert!(!follower.is_following());

        // A new text re-enables following
        let next = scheduler.start(Arc::from("x y z w v"), start + tick * 8).unwrap();
        follower.reset(next);
        assert!(follower.is_following());
        run(&mut scheduler, &mut follower, start + tick * 13);
        assert_eq!(follower.viewport().unwrap().offset(), 2);
    }

    #[test]
    fn test_stale_generation_ignored() {
        let start = Instant::now();
        let tick = RevealScheduler::DEFAULT_INTERVAL;
        let mut scheduler = RevealScheduler::with_defaults();
        let mut follower = ScrollFollower::default();
        follower.attach(LineViewport::default());

        scheduler.start(Arc::from("a b c d e"), start).unwrap();
        // follower never reset for this generation
        run(&mut scheduler, &mut follower, start + tick * 5);
        assert_eq!(follower.viewport().unwrap().pins, 0);
    }

    #[test]
    fn test_detached_ignores_everything() {
        let start = Instant::now();
        let tick = RevealScheduler::DEFAULT_INTERVAL;
        let mut scheduler = RevealScheduler::with_defaults();
        let mut follower: ScrollFollower<LineViewport> = ScrollFollower::default();
        follower.attach(LineViewport::default());

        let generation = scheduler.start(Arc::from("a b c d e"), start).unwrap();
        follower.reset(generation);
        let detached = follower.detach().unwrap();
        assert_eq!(detached.pins, 0);

        assert!(!follower.on_input(ViewportInput::Wheel));
        run(&mut scheduler, &mut follower, start + tick * 5);
        assert!(follower.is_following());
        assert!(!follower.is_attached());
    }
}

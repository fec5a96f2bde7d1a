//! One reading session: the reveal, follow mode, narration and status
//! caption of a single document, driven by one host.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::follow::{ScrollFollower, Viewport, ViewportInput};
use crate::narration::{NarrationCapability, NarrationController, NarrationEvent, SettingKind};
use crate::reveal::{Generation, RevealEvent, RevealScheduler, RevealState, StatusLabelAnimator};

/// Composes the reveal scheduler, scroll follower, narration controller
/// and status caption behind the operations a host needs
///
/// The host owns the clock: it calls `update(now)` at or after
/// `next_deadline()` and forwards narration events and user scrolling.
pub struct ReadingSession<C, V> {
    reveal: RevealScheduler,
    follower: ScrollFollower<V>,
    narration: NarrationController<C>,
    label: StatusLabelAnimator,
    generating: bool,
    torn_down: bool,
}

impl<C: NarrationCapability, V: Viewport> ReadingSession<C, V> {
    pub fn new(config: &AppConfig, capability: C) -> Self {
        Self {
            reveal: RevealScheduler::from_config(&config.reveal),
            follower: ScrollFollower::new(config.reveal.follow_on_start),
            narration: NarrationController::from_config(capability, &config.narration),
            label: StatusLabelAnimator::from_config(&config.label),
            generating: false,
            torn_down: false,
        }
    }

    /// Attach the surface showing the revealed text
    pub fn attach_viewport(&mut self, viewport: V) -> Option<V> {
        self.follower.attach(viewport)
    }

    pub fn detach_viewport(&mut self) -> Option<V> {
        self.follower.detach()
    }

    /// Replace the source text and reveal it from the beginning
    ///
    /// Narration is handed the full text; a live utterance of the previous
    /// text is cancelled. Text without words is ignored.
    pub fn start_reveal(&mut self, text: impl Into<Arc<str>>, now: Instant) -> Option<Generation> {
        let text = text.into();
        let generation = self.reveal.start(Arc::clone(&text), now)?;
        info!(generation, bytes = text.len(), "New source text");
        self.torn_down = false;

        self.follower.reset(generation);
        if let Some(viewport) = self.follower.viewport_mut() {
            viewport.observe_content("");
        }
        self.narration.set_text(text);
        self.refresh_label(now);
        Some(generation)
    }

    /// Stop the reveal where it is. The caption settles on the next `update`.
    pub fn cancel_reveal(&mut self) -> bool {
        self.reveal.cancel()
    }

    /// Play/pause button
    pub fn play_pause(&mut self) {
        self.narration.toggle();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.narration.set_volume(volume);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.narration.set_rate(rate);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.narration.set_pitch(pitch);
    }

    pub fn set_voice(&mut self, id: &str) -> crate::Result<()> {
        self.narration.set_voice(id)
    }

    pub fn step_setting(&mut self, kind: SettingKind, steps: i32) {
        self.narration.step_setting(kind, steps);
    }

    pub fn cycle_voice(&mut self, forward: bool) -> crate::Result<()> {
        self.narration.cycle_voice(forward)
    }

    /// The text provider started or stopped producing text
    pub fn set_generating(&mut self, generating: bool, now: Instant) {
        if self.generating != generating {
            debug!(generating, "Provider state changed");
        }
        self.generating = generating;
        self.refresh_label(now);
    }

    /// A manual scroll gesture. Returns true when it released follow mode.
    pub fn handle_viewport_input(&mut self, input: ViewportInput) -> bool {
        self.follower.on_input(input)
    }

    pub fn handle_narration_event(&mut self, event: NarrationEvent) {
        self.narration.handle_event(event);
    }

    /// Advance timers to `now`, returning the reveal events that fired
    pub fn update(&mut self, now: Instant) -> Vec<RevealEvent> {
        if self.torn_down {
            return Vec::new();
        }
        let events = self.reveal.update(now);
        for event in &events {
            if let RevealEvent::Tick(frame) = event {
                self.follower.on_tick(frame);
            }
        }

        self.refresh_label(now);
        self.label.update(now);
        events
    }

    fn refresh_label(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        let busy = self.generating || self.reveal.is_active();
        self.label.set_busy(busy, now);
    }

    /// Earliest instant at which `update` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.reveal.next_deadline(), self.label.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Stop every timer and utterance and let go of the viewport
    ///
    /// Safe to call more than once. Only a new `start_reveal` revives the session.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.reveal.cancel();
        self.label.teardown();
        self.narration.teardown();
        if self.follower.detach().is_some() {
            debug!("Viewport detached");
        }
    }

    pub fn reveal_state(&self) -> RevealState<'_> {
        self.reveal.state()
    }

    /// Currently revealed prefix of the source text
    pub fn revealed(&self) -> &str {
        self.reveal.revealed()
    }

    /// (revealed, total) word counts
    pub fn progress(&self) -> (usize, usize) {
        self.reveal.progress()
    }

    /// Status caption visible right now
    pub fn label(&self) -> &str {
        self.label.label()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_following(&self) -> bool {
        self.follower.is_following()
    }

    pub fn narration(&self) -> &NarrationController<C> {
        &self.narration
    }

    pub fn narration_mut(&mut self) -> &mut NarrationController<C> {
        &mut self.narration
    }

    pub fn viewport(&self) -> Option<&V> {
        self.follower.viewport()
    }

    pub fn viewport_mut(&mut self) -> Option<&mut V> {
        self.follower.viewport_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follow::tests::LineViewport;
    use crate::narration::mock::{Call, RecordingCapability};
    use crate::narration::PlaybackState;
    use std::time::Duration;

    const WORD: Duration = RevealScheduler::DEFAULT_INTERVAL;
    const CHAR: Duration = StatusLabelAnimator::DEFAULT_INTERVAL;

    fn session() -> ReadingSession<RecordingCapability, LineViewport> {
        let mut session = ReadingSession::new(&AppConfig::default(), RecordingCapability::default());
        session.attach_viewport(LineViewport::default());
        session
    }

    #[test]
    fn test_reveal_pins_viewport_and_feeds_narration() {
        let start = Instant::now();
        let mut s = session();
        let text = "one two three four five six";
        s.start_reveal(text, start).unwrap();

        for k in 1..=6 {
            s.update(start + WORD * k);
            let viewport = s.viewport().unwrap();
            assert_eq!(viewport.offset(), viewport.max_offset());
        }
        assert_eq!(s.revealed(), text);

        s.play_pause();
        assert_eq!(s.narration().state(), PlaybackState::Playing);
        let speaks = s.narration().capability().speaks();
        assert_eq!(&*speaks[0].text, text);
    }

    #[test]
    fn test_narration_speaks_full_text_mid_reveal() {
        let start = Instant::now();
        let mut s = session();
        s.start_reveal("alpha beta gamma delta", start);
        s.update(start + WORD);
        assert_eq!(s.revealed(), "alpha");

        s.play_pause();
        let speaks = s.narration().capability().speaks();
        assert_eq!(&*speaks[0].text, "alpha beta gamma delta");
    }

    #[test]
    fn test_caption_busy_while_revealing() {
        let start = Instant::now();
        let mut s = session();
        s.start_reveal("a b c", start);

        s.update(start + WORD * 2);
        // 80ms in: one caption char at 70ms
        assert_eq!(s.label(), "G");

        // Reveal completes at 120ms and the caption restarts idle
        let done = start + WORD * 3;
        s.update(done);
        assert_eq!(s.label(), "");
        s.update(done + CHAR * 6);
        assert_eq!(s.label(), "Answer");
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn test_generating_keeps_caption_busy() {
        let start = Instant::now();
        let mut s = session();
        s.set_generating(true, start);
        s.start_reveal("a b", start);
        s.update(start + WORD * 2);
        assert!(!s.reveal_state().active);

        let later = start + CHAR * 30;
        s.update(later);
        assert_eq!(s.label(), "Generating Summary...");

        s.set_generating(false, later);
        s.update(later + CHAR * 2);
        assert_eq!(s.label(), "An");
    }

    #[test]
    fn test_new_text_cancels_playback_and_refollows() {
        let start = Instant::now();
        let mut s = session();
        s.start_reveal("a b c d e f g h", start);
        s.update(start + WORD * 5);
        s.play_pause();

        assert!(s.handle_viewport_input(ViewportInput::Wheel));
        assert!(!s.is_following());

        let next = start + WORD * 5;
        s.start_reveal("fresh words arrive here now", next);
        assert!(s.is_following());
        assert_eq!(s.narration().state(), PlaybackState::Idle);
        assert_eq!(s.viewport().unwrap().offset(), 0);

        s.update(next + WORD * 5);
        assert_eq!(s.viewport().unwrap().offset(), 2);
    }

    #[test]
    fn test_empty_text_ignored() {
        let start = Instant::now();
        let mut s = session();
        s.start_reveal("keep this", start);
        s.update(start + WORD * 2);

        assert!(s.start_reveal("   ", start + WORD * 2).is_none());
        assert_eq!(s.revealed(), "keep this");
        assert_eq!(s.narration().text().map(|t| &**t), Some("keep this"));
    }

    #[test]
    fn test_settings_pass_through() {
        let start = Instant::now();
        let mut s = session();
        s.start_reveal("a b", start);
        s.play_pause();

        s.set_rate(1.5);
        s.step_setting(SettingKind::Volume, -3);
        let settings = s.narration().settings();
        assert_eq!(settings.rate, 1.5);
        assert!((settings.volume - 0.7).abs() < 1e-6);

        let speaks = s.narration().capability().speaks();
        assert_eq!(speaks.len(), 3);
        assert!(s.set_voice("nobody").is_err());
    }

    #[test]
    fn test_teardown_stops_everything() {
        let start = Instant::now();
        let mut s = session();
        s.start_reveal("a b c d", start);
        s.update(start + WORD);
        s.play_pause();

        s.teardown();
        s.teardown();

        assert!(s.viewport().is_none());
        assert_eq!(s.narration().state(), PlaybackState::Idle);
        assert!(s.update(start + WORD * 10).is_empty());
        assert_eq!(s.revealed(), "a");
        assert!(s.next_deadline().is_none());

        let cap = s.narration().capability();
        assert_eq!(cap.count(|c| matches!(c, Call::Cancel)), 3);
    }
}

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::capability::{NarrationCapability, NarrationEvent};
use super::machine::{self, Effect, NarrationInput, PlaybackState};
use super::settings::{NarrationSettings, SettingKind};
use super::utterance::{Utterance, UtteranceId};
use super::voice::{VoiceCatalog, VoiceDescriptor, VoiceSelection};
use crate::config::NarrationConfig;
use crate::{Error, Result};

/// Play/pause/resume controller wrapping a narration capability
///
/// The controller is the only caller of the capability. Every operation
/// feeds the pure state machine in `machine` and then performs the
/// effects it asks for, so "cancel before speak" holds for every start.
pub struct NarrationController<C> {
    capability: C,
    state: PlaybackState,
    settings: NarrationSettings,
    selection: VoiceSelection,
    /// Voice to select as soon as the catalog offers it
    preferred_voice: Option<String>,
    catalog: VoiceCatalog,
    text: Option<Arc<str>>,
    /// Utterance whose events are still meaningful
    current: Option<UtteranceId>,
    next_id: UtteranceId,
    restart_on_new_text: bool,
    last_error: Option<String>,
}

impl<C: NarrationCapability> NarrationController<C> {
    pub fn new(capability: C) -> Self {
        Self {
            capability,
            state: PlaybackState::Idle,
            settings: NarrationSettings::default(),
            selection: VoiceSelection::None,
            preferred_voice: None,
            catalog: VoiceCatalog::default(),
            text: None,
            current: None,
            next_id: 1,
            restart_on_new_text: false,
            last_error: None,
        }
    }

    pub fn from_config(capability: C, config: &NarrationConfig) -> Self {
        let mut controller = Self::new(capability);
        controller.settings = NarrationSettings::from_config(config);
        controller.preferred_voice = config.voice.clone();
        controller.restart_on_new_text = config.restart_on_new_text;
        controller
    }

    /// Replace the text to narrate
    ///
    /// Any live utterance belongs to the old text and is cancelled, unless
    /// `restart_on_new_text` is set and narration was playing, in which
    /// case the new text is spoken from the start.
    pub fn set_text(&mut self, text: impl Into<Arc<str>>) {
        let text = text.into();
        let has_text = !text.trim().is_empty();
        let restart = has_text && self.restart_on_new_text;

        self.text = has_text.then_some(text);
        self.apply(NarrationInput::TextReplaced { restart });
    }

    /// Speak `text` from the beginning. Empty text is ignored.
    pub fn play(&mut self, text: impl Into<Arc<str>>) -> bool {
        let text = text.into();
        if text.trim().is_empty() {
            debug!("Ignoring play request without text");
            return false;
        }
        self.text = Some(text);
        self.apply(NarrationInput::Play);
        true
    }

    pub fn pause(&mut self) {
        self.apply(NarrationInput::Pause);
    }

    pub fn resume(&mut self) {
        self.apply(NarrationInput::Resume);
    }

    /// Play/pause button behaviour
    pub fn toggle(&mut self) {
        if self.state.is_active() && !self.capability.is_speaking() {
            // The capability finished without an event reaching us yet
            debug!(state = ?self.state, "Capability idle, discarding stale playback state");
            self.current = None;
            self.state = PlaybackState::Ended;
        }

        if !self.state.is_active() && self.text.is_none() {
            debug!("Nothing to narrate");
            return;
        }

        self.apply(NarrationInput::Toggle);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.update_settings(self.settings.with(SettingKind::Rate, rate));
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.update_settings(self.settings.with(SettingKind::Volume, volume));
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.update_settings(self.settings.with(SettingKind::Pitch, pitch));
    }

    /// Move a setting by `steps` keyboard increments
    pub fn step_setting(&mut self, kind: SettingKind, steps: i32) {
        self.update_settings(self.settings.stepped(kind, steps));
    }

    fn update_settings(&mut self, settings: NarrationSettings) {
        if settings == self.settings {
            return;
        }
        debug!(?settings, "Narration settings changed");
        self.settings = settings;
        self.apply(NarrationInput::SettingsChanged);
    }

    /// Explicitly choose a voice from the catalog
    pub fn set_voice(&mut self, id: &str) -> Result<()> {
        if self.catalog.get(id).is_none() {
            return Err(Error::VoiceNotFound(id.to_string()));
        }
        let changed = self.selection.voice_id() != Some(id);
        self.selection = VoiceSelection::Explicit(id.to_string());
        if changed {
            info!(voice = id, "Voice selected");
            self.apply(NarrationInput::SettingsChanged);
        }
        Ok(())
    }

    /// Select the next (or previous) voice in the catalog
    pub fn cycle_voice(&mut self, forward: bool) -> Result<()> {
        let id = self
            .catalog
            .neighbour(self.selection.voice_id(), forward)
            .map(|v| v.id.clone())
            .ok_or_else(|| Error::Narration("no voices available".to_string()))?;
        self.set_voice(&id)
    }

    /// Feed an event reported by the capability
    pub fn handle_event(&mut self, event: NarrationEvent) {
        if let NarrationEvent::CatalogChanged = event {
            self.refresh_catalog();
            return;
        }

        if event.utterance() != self.current {
            debug!(?event, current = ?self.current, "Ignoring event for stale utterance");
            return;
        }

        match event {
            NarrationEvent::Started(id) => {
                debug!(utterance = id, "Narration started");
                self.apply(NarrationInput::Started);
            }
            NarrationEvent::Ended(id) => {
                info!(utterance = id, "Narration finished");
                self.current = None;
                self.apply(NarrationInput::Ended);
            }
            NarrationEvent::Errored(id, message) => {
                warn!(utterance = id, "Narration failed: {}", message);
                self.current = None;
                self.last_error = Some(message);
                self.apply(NarrationInput::Errored);
            }
            NarrationEvent::CatalogChanged => {}
        }
    }

    fn refresh_catalog(&mut self) {
        self.catalog = VoiceCatalog::from_voices(self.capability.list_voices());
        debug!(voices = self.catalog.len(), "Voice catalog updated");

        if self.selection.is_explicit() {
            if let Some(id) = self.selection.voice_id() {
                if self.catalog.get(id).is_none() {
                    warn!(voice = id, "Selected voice is no longer offered");
                }
            }
            return;
        }

        let previous = self.selection.voice_id().map(str::to_string);
        let preferred = self
            .preferred_voice
            .as_deref()
            .and_then(|key| self.catalog.lookup(key))
            .map(|voice| voice.id.clone());
        self.selection = match preferred {
            Some(id) => VoiceSelection::Explicit(id),
            None => match self.catalog.first() {
                Some(voice) => VoiceSelection::Default(voice.id.clone()),
                None => VoiceSelection::None,
            },
        };

        if self.selection.voice_id() != previous.as_deref() {
            self.apply(NarrationInput::SettingsChanged);
        }
    }

    /// Cancel everything and return to idle. Safe to call in any state.
    pub fn teardown(&mut self) {
        self.apply(NarrationInput::Teardown);
    }

    fn apply(&mut self, input: NarrationInput) {
        let transition = machine::step(self.state, input);
        if transition.next != self.state {
            debug!(from = ?self.state, to = ?transition.next, ?input, "Playback transition");
        }
        self.state = transition.next;

        for effect in transition.effects {
            self.perform(*effect);
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::Cancel => {
                self.capability.cancel();
                self.current = None;
            }
            Effect::Speak => {
                let Some(text) = self.text.clone() else {
                    warn!("Speak requested without text");
                    self.state = PlaybackState::Idle;
                    return;
                };
                let id = self.next_id;
                self.next_id += 1;

                let utterance = Utterance::new(id, text, self.selected_voice(), self.settings);
                info!(
                    utterance = id,
                    voice = utterance.voice.as_ref().map(|v| v.id.as_str()).unwrap_or("default"),
                    rate = utterance.rate,
                    volume = utterance.volume,
                    pitch = utterance.pitch,
                    "Speaking"
                );
                self.current = Some(id);
                self.last_error = None;
                self.capability.speak(utterance);
            }
            Effect::Pause => self.capability.pause(),
            Effect::Resume => self.capability.resume(),
        }
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn settings(&self) -> NarrationSettings {
        self.settings
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &VoiceSelection {
        &self.selection
    }

    /// Voice the next utterance will use
    pub fn selected_voice(&self) -> Option<&VoiceDescriptor> {
        self.selection.voice_id().and_then(|id| self.catalog.get(id))
    }

    pub fn text(&self) -> Option<&Arc<str>> {
        self.text.as_ref()
    }

    pub fn current_utterance(&self) -> Option<UtteranceId> {
        self.current
    }

    /// Message of the most recent capability failure, cleared by the next speak
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    pub fn capability_mut(&mut self) -> &mut C {
        &mut self.capability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::mock::{Call, RecordingCapability};

    const TEXT: &str = "It was a bright cold day in April";

    fn voices() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("en-us", "English (America)", "en-US"),
            VoiceDescriptor::new("fr", "French", "fr-FR"),
        ]
    }

    fn controller() -> NarrationController<RecordingCapability> {
        NarrationController::new(RecordingCapability::default())
    }

    fn playing() -> NarrationController<RecordingCapability> {
        let mut c = controller();
        assert!(c.play(TEXT));
        c
    }

    #[test]
    fn test_play_pause_resume_speaks_once() {
        let mut c = playing();
        c.pause();
        assert_eq!(c.state(), PlaybackState::Paused);
        c.resume();
        assert_eq!(c.state(), PlaybackState::Playing);

        let cap = c.capability();
        assert_eq!(cap.speaks().len(), 1);
        assert_eq!(cap.count(|c| matches!(c, Call::Pause)), 1);
        assert_eq!(cap.count(|c| matches!(c, Call::Resume)), 1);
    }

    #[test]
    fn test_toggle_sequence() {
        let mut c = controller();
        c.set_text(TEXT);
        c.toggle();
        assert_eq!(c.state(), PlaybackState::Playing);
        c.toggle();
        assert_eq!(c.state(), PlaybackState::Paused);
        c.toggle();
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.capability().speaks().len(), 1);
    }

    #[test]
    fn test_toggle_without_text_does_nothing() {
        let mut c = controller();
        c.toggle();
        assert_eq!(c.state(), PlaybackState::Idle);
        assert!(c.capability().calls.is_empty());
    }

    #[test]
    fn test_rate_change_while_playing_restarts_with_new_rate() {
        let mut c = playing();
        let before = c.capability().calls.len();

        c.set_rate(1.5);

        let calls = &c.capability().calls[before..];
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::Cancel);
        match &calls[1] {
            Call::Speak(u) => {
                assert_eq!(u.rate, 1.5);
                assert_eq!(&*u.text, TEXT);
            }
            other => panic!("expected speak, got {:?}", other),
        }
        assert_eq!(c.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_settings_recorded_while_paused() {
        let mut c = playing();
        c.pause();
        let before = c.capability().calls.len();

        c.set_volume(0.4);
        c.set_pitch(1.8);

        assert_eq!(c.capability().calls.len(), before);
        assert_eq!(c.state(), PlaybackState::Paused);
        assert_eq!(c.settings().volume, 0.4);

        c.teardown();
        c.play(TEXT);
        let last = c.capability().speaks().pop().unwrap().clone();
        assert_eq!(last.volume, 0.4);
        assert_eq!(last.pitch, 1.8);
    }

    #[test]
    fn test_unchanged_setting_does_not_restart() {
        let mut c = playing();
        let before = c.capability().calls.len();
        c.set_rate(1.0);
        c.set_volume(7.0);
        c.set_volume(7.0);
        // Volume clamps back to its current 1.0
        assert_eq!(c.capability().calls.len(), before);
    }

    #[test]
    fn test_teardown_cancels_exactly_once_in_every_state() {
        for target in [
            PlaybackState::Idle,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Ended,
            PlaybackState::Errored,
        ] {
            let mut c = controller();
            if target != PlaybackState::Idle {
                c.play(TEXT);
            }
            let id = c.current_utterance();
            match target {
                PlaybackState::Paused => c.pause(),
                PlaybackState::Ended => c.handle_event(NarrationEvent::Ended(id.unwrap())),
                PlaybackState::Errored => {
                    c.handle_event(NarrationEvent::Errored(id.unwrap(), "boom".into()))
                }
                _ => {}
            }
            assert_eq!(c.state(), target);

            let before = c.capability().cancels();
            c.teardown();
            assert_eq!(c.capability().cancels() - before, 1);
            assert_eq!(c.state(), PlaybackState::Idle);
        }
    }

    #[test]
    fn test_end_and_error_events() {
        let mut c = playing();
        let id = c.current_utterance().unwrap();
        c.handle_event(NarrationEvent::Started(id));
        assert_eq!(c.state(), PlaybackState::Playing);

        c.handle_event(NarrationEvent::Errored(id, "device busy".into()));
        assert_eq!(c.state(), PlaybackState::Errored);
        assert_eq!(c.last_error(), Some("device busy"));
        assert!(c.current_utterance().is_none());

        // Retry is always allowed
        c.capability_mut().speaking = false;
        c.toggle();
        assert_eq!(c.state(), PlaybackState::Playing);
        assert!(c.last_error().is_none());

        let id = c.current_utterance().unwrap();
        c.handle_event(NarrationEvent::Ended(id));
        assert_eq!(c.state(), PlaybackState::Ended);
    }

    #[test]
    fn test_stale_events_ignored() {
        let mut c = playing();
        let first = c.current_utterance().unwrap();
        c.set_rate(2.0);
        let second = c.current_utterance().unwrap();
        assert_ne!(first, second);

        c.handle_event(NarrationEvent::Ended(first));
        assert_eq!(c.state(), PlaybackState::Playing);
        c.handle_event(NarrationEvent::Errored(first, "cancelled".into()));
        assert_eq!(c.state(), PlaybackState::Playing);
        assert!(c.last_error().is_none());
    }

    #[test]
    fn test_empty_play_ignored() {
        let mut c = controller();
        assert!(!c.play(""));
        assert!(!c.play("   "));
        assert_eq!(c.state(), PlaybackState::Idle);
        assert!(c.capability().calls.is_empty());
    }

    #[test]
    fn test_catalog_selects_first_voice_by_default() {
        let mut c = NarrationController::new(RecordingCapability::with_voices(voices()));
        c.handle_event(NarrationEvent::CatalogChanged);
        assert_eq!(c.selection(), &VoiceSelection::Default("en-us".into()));

        c.play(TEXT);
        let utterance = c.capability().speaks()[0].clone();
        assert_eq!(utterance.voice.unwrap().id, "en-us");
        assert_eq!(utterance.lang, "en-US");
    }

    #[test]
    fn test_late_catalog_keeps_explicit_choice() {
        let mut c = NarrationController::new(RecordingCapability::with_voices(voices()));
        c.handle_event(NarrationEvent::CatalogChanged);
        c.set_voice("fr").unwrap();

        c.capability_mut().voices.insert(
            0,
            VoiceDescriptor::new("de", "German", "de-DE"),
        );
        c.handle_event(NarrationEvent::CatalogChanged);

        assert_eq!(c.selection(), &VoiceSelection::Explicit("fr".into()));
        assert_eq!(c.catalog().len(), 3);
    }

    #[test]
    fn test_unknown_voice_rejected() {
        let mut c = controller();
        let err = c.set_voice("klingon").unwrap_err();
        assert!(matches!(err, Error::VoiceNotFound(_)));
        assert_eq!(c.selection(), &VoiceSelection::None);
    }

    #[test]
    fn test_preferred_voice_from_config() {
        let config = NarrationConfig {
            voice: Some("fr".into()),
            ..Default::default()
        };
        let mut c =
            NarrationController::from_config(RecordingCapability::with_voices(voices()), &config);
        c.handle_event(NarrationEvent::CatalogChanged);
        assert_eq!(c.selection(), &VoiceSelection::Explicit("fr".into()));
    }

    #[test]
    fn test_preferred_voice_by_name() {
        let config = NarrationConfig {
            voice: Some("French".into()),
            ..Default::default()
        };
        let mut c =
            NarrationController::from_config(RecordingCapability::with_voices(voices()), &config);
        c.handle_event(NarrationEvent::CatalogChanged);
        assert_eq!(c.selection(), &VoiceSelection::Explicit("fr".into()));
    }

    #[test]
    fn test_voice_change_while_playing_restarts() {
        let mut c = NarrationController::new(RecordingCapability::with_voices(voices()));
        c.handle_event(NarrationEvent::CatalogChanged);
        c.play(TEXT);

        c.cycle_voice(true).unwrap();
        let speaks = c.capability().speaks();
        assert_eq!(speaks.len(), 2);
        assert_eq!(speaks[1].voice.as_ref().unwrap().id, "fr");
        assert_eq!(speaks[1].lang, "fr-FR");
    }

    #[test]
    fn test_new_text_invalidates_playback() {
        let mut c = playing();
        c.set_text("A different document");
        assert_eq!(c.state(), PlaybackState::Idle);
        assert!(c.current_utterance().is_none());
        assert_eq!(c.capability().speaks().len(), 1);
    }

    #[test]
    fn test_new_text_restarts_when_configured() {
        let config = NarrationConfig {
            restart_on_new_text: true,
            ..Default::default()
        };
        let mut c = NarrationController::from_config(RecordingCapability::default(), &config);
        c.play(TEXT);
        c.set_text("A different document");

        assert_eq!(c.state(), PlaybackState::Playing);
        let speaks = c.capability().speaks();
        assert_eq!(speaks.len(), 2);
        assert_eq!(&*speaks[1].text, "A different document");
    }

    #[test]
    fn test_toggle_restarts_when_capability_went_quiet() {
        let mut c = playing();
        // Capability finished but the end event has not been delivered
        c.capability_mut().speaking = false;
        c.toggle();
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.capability().speaks().len(), 2);
    }
}

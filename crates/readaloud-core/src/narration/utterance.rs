use std::sync::Arc;

use super::settings::NarrationSettings;
use super::voice::VoiceDescriptor;

/// Identifies one utterance handed to the capability
pub type UtteranceId = u64;

/// Language used when no voice is selected
pub const DEFAULT_LANG: &str = "en-US";

/// One fully specified unit of speech
///
/// Built fresh for every (re)start and never changed while speaking.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: Arc<str>,
    pub voice: Option<VoiceDescriptor>,
    pub lang: String,
    pub rate: f32,
    pub volume: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn new(
        id: UtteranceId,
        text: Arc<str>,
        voice: Option<&VoiceDescriptor>,
        settings: NarrationSettings,
    ) -> Self {
        Self {
            id,
            text,
            lang: voice
                .map(|v| v.lang.clone())
                .unwrap_or_else(|| DEFAULT_LANG.to_string()),
            voice: voice.cloned(),
            rate: settings.rate,
            volume: settings.volume,
            pitch: settings.pitch,
        }
    }

    pub fn settings(&self) -> NarrationSettings {
        NarrationSettings {
            rate: self.rate,
            volume: self.volume,
            pitch: self.pitch,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

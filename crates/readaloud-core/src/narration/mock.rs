//! Recording capability for tests

use super::{NarrationCapability, Utterance, VoiceDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Speak(Utterance),
    Pause,
    Resume,
    Cancel,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingCapability {
    pub calls: Vec<Call>,
    pub voices: Vec<VoiceDescriptor>,
    pub speaking: bool,
}

impl RecordingCapability {
    pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Self {
        Self {
            voices,
            ..Default::default()
        }
    }

    pub fn speaks(&self) -> Vec<&Utterance> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Speak(u) => Some(u),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| call(c)).count()
    }

    pub fn cancels(&self) -> usize {
        self.count(|c| matches!(c, Call::Cancel))
    }
}

impl NarrationCapability for RecordingCapability {
    fn speak(&mut self, utterance: Utterance) {
        assert!(
            !self.speaking,
            "speak while another utterance is live"
        );
        self.speaking = true;
        self.calls.push(Call::Speak(utterance));
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn resume(&mut self) {
        self.calls.push(Call::Resume);
    }

    fn cancel(&mut self) {
        self.speaking = false;
        self.calls.push(Call::Cancel);
    }

    fn is_speaking(&self) -> bool {
        self.speaking
    }

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.clone()
    }
}

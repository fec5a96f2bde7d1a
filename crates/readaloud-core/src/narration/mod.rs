//! Narration: a play/pause/resume state machine around a speech capability

pub mod backend;
mod capability;
mod controller;
pub mod machine;
mod settings;
mod utterance;
mod voice;

#[cfg(test)]
pub(crate) mod mock;

pub use capability::{NarrationCapability, NarrationEvent, NarrationEventSender};
pub use controller::NarrationController;
pub use machine::{Effect, NarrationInput, PlaybackState, Transition};
pub use settings::{NarrationSettings, SettingKind};
pub use utterance::{Utterance, UtteranceId, DEFAULT_LANG};
pub use voice::{VoiceCatalog, VoiceDescriptor, VoiceSelection};

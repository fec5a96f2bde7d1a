use tokio::sync::mpsc;

use super::utterance::{Utterance, UtteranceId};
use super::voice::VoiceDescriptor;

/// Asynchronous notifications from a narration capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    /// The utterance began producing speech
    Started(UtteranceId),
    /// The utterance finished on its own
    Ended(UtteranceId),
    /// The utterance failed
    Errored(UtteranceId, String),
    /// The voice list changed; read it with `list_voices()`
    CatalogChanged,
}

impl NarrationEvent {
    /// Utterance the event refers to, if any
    pub fn utterance(&self) -> Option<UtteranceId> {
        match self {
            NarrationEvent::Started(id)
            | NarrationEvent::Ended(id)
            | NarrationEvent::Errored(id, _) => Some(*id),
            NarrationEvent::CatalogChanged => None,
        }
    }
}

/// Channel a capability reports its events on
pub type NarrationEventSender = mpsc::UnboundedSender<NarrationEvent>;

/// The text-to-speech boundary
///
/// Every call is fire-and-forget: outcomes arrive later as
/// `NarrationEvent`s. Cancelled utterances report nothing. Implementations
/// must treat `cancel` as idempotent.
pub trait NarrationCapability {
    fn speak(&mut self, utterance: Utterance);

    fn pause(&mut self);

    fn resume(&mut self);

    fn cancel(&mut self);

    /// Whether an utterance is live (paused counts as speaking)
    fn is_speaking(&self) -> bool;

    fn list_voices(&self) -> Vec<VoiceDescriptor>;
}

impl<T: NarrationCapability + ?Sized> NarrationCapability for Box<T> {
    fn speak(&mut self, utterance: Utterance) {
        (**self).speak(utterance)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    fn is_speaking(&self) -> bool {
        (**self).is_speaking()
    }

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        (**self).list_voices()
    }
}

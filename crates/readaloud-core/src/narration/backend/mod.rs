//! Concrete narration capabilities

mod command;
mod simulated;

pub use command::{parse_voice_list, speech_args, CommandNarrator};
pub use simulated::{speaking_duration, SimulatedNarrator};

use tracing::info;

use super::{NarrationCapability, NarrationEventSender};
use crate::config::{NarrationBackend, NarrationConfig};

/// Boxed capability chosen at runtime
pub type Narrator = Box<dyn NarrationCapability + Send>;

/// Build the configured backend. Must be called inside a tokio runtime.
pub fn build_capability(config: &NarrationConfig, events: NarrationEventSender) -> Narrator {
    info!(backend = ?config.backend, "Using narration backend");
    match config.backend {
        NarrationBackend::Simulated => {
            Box::new(SimulatedNarrator::new(config.words_per_minute, events))
        }
        NarrationBackend::Command => Box::new(CommandNarrator::new(&config.program, events)),
    }
}

pub mod config;
pub mod error;
pub mod follow;
pub mod narration;
pub mod reveal;
pub mod session;
pub mod source;

pub use config::{AppConfig, NarrationBackend};
pub use error::{Error, Result};
pub use follow::{ScrollFollower, Viewport, ViewportInput};
pub use narration::{
    NarrationCapability, NarrationController, NarrationEvent, NarrationSettings, PlaybackState,
    Utterance, VoiceCatalog, VoiceDescriptor,
};
pub use reveal::{RevealEvent, RevealFrame, RevealScheduler, StatusLabelAnimator};
pub use session::ReadingSession;

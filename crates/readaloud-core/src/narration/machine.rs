//! Pure playback state machine
//!
//! `step` maps (state, input) to the next state and the side effects the
//! controller must perform, in order. It never touches the capability.

/// Narration playback state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Ended,
    Errored,
}

impl PlaybackState {
    /// Whether an utterance is live (speaking or paused)
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Ended => "Ended",
            PlaybackState::Errored => "Error",
        }
    }
}

/// Everything that can drive the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationInput {
    /// Speak the current text from the beginning
    Play,
    Pause,
    Resume,
    /// Play/pause button: pause, resume or play depending on the state
    Toggle,
    /// Voice, rate, volume or pitch changed
    SettingsChanged,
    /// Capability started the current utterance
    Started,
    /// Capability finished the current utterance
    Ended,
    /// Capability failed the current utterance
    Errored,
    /// The source text was replaced
    TextReplaced { restart: bool },
    /// Hosting view is going away
    Teardown,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Cancel whatever the capability is speaking
    Cancel,
    /// Build an utterance from the current text and settings and speak it
    Speak,
    Pause,
    Resume,
}

/// Result of one `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: PlaybackState,
    pub effects: &'static [Effect],
}

impl Transition {
    const fn to(next: PlaybackState, effects: &'static [Effect]) -> Self {
        Self { next, effects }
    }

    const fn stay(state: PlaybackState) -> Self {
        Self::to(state, &[])
    }
}

/// Speaking always cancels first: at most one utterance is ever in flight.
const RESTART: &[Effect] = &[Effect::Cancel, Effect::Speak];

pub fn step(state: PlaybackState, input: NarrationInput) -> Transition {
    use NarrationInput as In;
    use PlaybackState::*;

    match (state, input) {
        (_, In::Play) => Transition::to(Playing, RESTART),

        (Playing, In::Pause) => Transition::to(Paused, &[Effect::Pause]),
        (Paused, In::Resume) => Transition::to(Playing, &[Effect::Resume]),

        (Playing, In::Toggle) => step(state, In::Pause),
        (Paused, In::Toggle) => step(state, In::Resume),
        (Idle | Ended | Errored, In::Toggle) => step(state, In::Play),

        // Live utterances cannot change parameters: restart from the top
        (Playing, In::SettingsChanged) => Transition::to(Playing, RESTART),

        (Playing | Paused, In::Ended) => Transition::stay(Ended),
        (Playing | Paused, In::Errored) => Transition::stay(Errored),

        (Playing, In::TextReplaced { restart: true }) => Transition::to(Playing, RESTART),
        (Playing | Paused, In::TextReplaced { .. }) => Transition::to(Idle, &[Effect::Cancel]),
        (Idle | Ended | Errored, In::TextReplaced { .. }) => Transition::stay(Idle),

        (_, In::Teardown) => Transition::to(Idle, &[Effect::Cancel]),

        // Started acknowledges a transition already taken; everything else
        // (pause while idle, resume while playing, ...) is a no-op
        _ => Transition::stay(state),
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use readaloud_core::narration::SettingKind;

/// Input action that can be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    PlayPause,
    /// Reload the document and reveal it again
    Reload,
    CancelReveal,
    /// Step a narration setting by the given number of increments
    Adjust(SettingKind, i32),
    NextVoice,
    PrevVoice,
    ScrollDown,
    ScrollUp,
    ScrollPageDown,
    ScrollPageUp,
    ToggleHelp,
    None,
}

/// Handle a key event and return the corresponding action
pub fn handle_key_event(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('d') | KeyCode::Char('f') => Action::ScrollPageDown,
            KeyCode::Char('u') | KeyCode::Char('b') => Action::ScrollPageUp,
            _ => Action::None,
        };
    }

    // Shifted symbols arrive with or without SHIFT depending on the terminal
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,

        // Playback
        KeyCode::Char(' ') => Action::PlayPause,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('x') => Action::CancelReveal,

        // Narration settings
        KeyCode::Char('+') | KeyCode::Char('=') => Action::Adjust(SettingKind::Volume, 1),
        KeyCode::Char('-') => Action::Adjust(SettingKind::Volume, -1),
        KeyCode::Char(']') => Action::Adjust(SettingKind::Rate, 1),
        KeyCode::Char('[') => Action::Adjust(SettingKind::Rate, -1),
        KeyCode::Char('}') => Action::Adjust(SettingKind::Pitch, 1),
        KeyCode::Char('{') => Action::Adjust(SettingKind::Pitch, -1),
        KeyCode::Char('v') => Action::NextVoice,
        KeyCode::Char('V') => Action::PrevVoice,

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
        KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
        KeyCode::PageDown => Action::ScrollPageDown,
        KeyCode::PageUp => Action::ScrollPageUp,

        KeyCode::Char('?') => Action::ToggleHelp,
        _ => Action::None,
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use readaloud_core::narration::backend::Narrator;
use readaloud_core::narration::SettingKind;
use readaloud_core::{
    AppConfig, NarrationCapability, NarrationEvent, ReadingSession, Viewport, ViewportInput,
};
use tracing::{debug, warn};

use crate::event::SourceEvent;
use crate::theme::Theme;
use crate::viewport::DocumentViewport;

/// Shown when `run` is started without a document
pub const WELCOME_TEXT: &str = "Welcome to readaloud.\n\n\
Open a document with `readaloud run FILE` and it appears here word by word. \
Press space to hear it read aloud, space again to pause and once more to resume. \
Adjust the volume with + and -, the speed with ] and [, the pitch with } and {, \
and cycle through the available voices with v and V.\n\n\
While the text is revealed the view follows the newest words. Scroll with j, k, \
the page keys or the mouse wheel to look around on your own. \
Press r to reveal the document again, x to stop the reveal and q to quit.";

/// Application state
pub struct App<C = Narrator> {
    /// Application configuration
    pub config: Arc<AppConfig>,
    pub theme: Theme,
    /// Reveal, follow mode, narration and caption of the open document
    pub session: ReadingSession<C, DocumentViewport>,
    /// Document name shown in the pane title
    pub title: String,
    /// Last text handed to the session, kept for replay
    pub text: Option<Arc<str>>,
    /// Status message
    pub status_message: Option<String>,
    pub show_help: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Row of the last mouse drag event
    drag_row: Option<u16>,
}

impl<C: NarrationCapability> App<C> {
    pub fn new(config: Arc<AppConfig>, capability: C, title: impl Into<String>) -> Self {
        let mut session = ReadingSession::new(&config, capability);
        session.attach_viewport(DocumentViewport::default());

        Self {
            show_help: config.ui.show_help,
            config,
            theme: Theme::default(),
            session,
            title: title.into(),
            text: None,
            status_message: None,
            should_quit: false,
            drag_row: None,
        }
    }

    /// The document is being read; the caption shows the busy text meanwhile
    pub fn begin_loading(&mut self, now: Instant) {
        self.set_status("Loading...");
        self.session.set_generating(true, now);
    }

    /// Handle the outcome of a document load
    pub fn on_source(&mut self, event: SourceEvent, now: Instant) {
        self.session.set_generating(false, now);
        match event {
            SourceEvent::Loaded(text) => {
                self.show_text(text, now);
            }
            SourceEvent::Failed(error) => {
                warn!("Failed to load document: {}", error);
                self.set_status(format!("Failed to load document: {}", error));
            }
        }
    }

    /// Reveal `text` from the start. Returns false for a document without words.
    pub fn show_text(&mut self, text: impl Into<Arc<str>>, now: Instant) -> bool {
        let text = text.into();
        if self.session.start_reveal(Arc::clone(&text), now).is_none() {
            self.set_status("Document is empty");
            return false;
        }
        self.text = Some(text);
        self.status_message = None;
        true
    }

    /// Reveal the current document again
    pub fn replay(&mut self, now: Instant) -> bool {
        match self.text.clone() {
            Some(text) => self.show_text(text, now),
            None => false,
        }
    }

    pub fn play_pause(&mut self) {
        self.session.play_pause();
    }

    pub fn cancel_reveal(&mut self) {
        if self.session.cancel_reveal() {
            self.set_status("Reveal stopped");
        }
    }

    pub fn adjust(&mut self, kind: SettingKind, steps: i32) {
        self.session.step_setting(kind, steps);
        let settings = self.session.narration().settings();
        let value = match kind {
            SettingKind::Rate => settings.rate,
            SettingKind::Volume => settings.volume,
            SettingKind::Pitch => settings.pitch,
        };
        self.set_status(format!("{}: {:.1}", kind.label(), value));
    }

    pub fn cycle_voice(&mut self, forward: bool) {
        match self.session.cycle_voice(forward) {
            Ok(()) => {
                let name = self.session.narration().selected_voice().map(|v| v.name.clone());
                if let Some(name) = name {
                    self.set_status(format!("Voice: {}", name));
                }
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    /// Scroll the document by hand, which releases follow mode
    pub fn scroll(&mut self, delta: i32, input: ViewportInput) {
        if self.session.handle_viewport_input(input) {
            debug!("Follow mode off");
        }
        if let Some(viewport) = self.session.viewport_mut() {
            viewport.scroll_by(delta);
        }
    }

    /// Lines moved by a page scroll
    pub fn page_size(&self) -> i32 {
        self.viewport()
            .map(|v| v.height().saturating_sub(1).max(1) as i32)
            .unwrap_or(1)
    }

    /// Mouse drag: the content moves with the pointer
    pub fn drag(&mut self, row: u16) {
        if let Some(previous) = self.drag_row {
            let delta = previous as i32 - row as i32;
            if delta != 0 {
                self.scroll(delta, ViewportInput::TouchMove);
            }
        }
        self.drag_row = Some(row);
    }

    pub fn end_drag(&mut self) {
        self.drag_row = None;
    }

    /// Match the viewport to the document pane
    pub fn resize_viewport(&mut self, width: u16, height: u16) {
        let pin = self.session.is_following() && self.session.reveal_state().active;
        if let Some(viewport) = self.session.viewport_mut() {
            viewport.resize(width, height);
            if pin {
                viewport.scroll_to_max();
            }
        }
    }

    /// Advance reveal and caption timers
    pub fn update(&mut self, now: Instant) {
        self.session.update(now);
    }

    pub fn handle_narration_event(&mut self, event: NarrationEvent) {
        self.session.handle_narration_event(event);
    }

    /// How long the event loop may block before the next timer is due
    pub fn poll_timeout(&self, now: Instant, max: Duration) -> Duration {
        self.session
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now).min(max))
            .unwrap_or(max)
    }

    pub fn viewport(&self) -> Option<&DocumentViewport> {
        self.session.viewport()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Stop reveal, caption and narration before the terminal is restored
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use readaloud_core::{NarrationCapability, PlaybackState};

use crate::app::App;

/// Playback state, voice and speech settings
pub struct NarrationBarWidget;

impl NarrationBarWidget {
    pub fn render<C: NarrationCapability>(frame: &mut Frame, area: Rect, app: &App<C>) {
        let theme = &app.theme;
        let narration = app.session.narration();
        let settings = narration.settings();

        let state = narration.state();
        let state_color = match state {
            PlaybackState::Playing => theme.playing,
            PlaybackState::Paused => theme.paused,
            PlaybackState::Errored => theme.error,
            PlaybackState::Idle | PlaybackState::Ended => theme.grey2,
        };
        let voice = narration
            .selected_voice()
            .map(|v| v.name.as_str())
            .unwrap_or("default voice");

        let mut spans = vec![
            Span::styled(
                format!(" {} ", state.label()),
                Style::default()
                    .fg(theme.bg0)
                    .bg(state_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    " {} | Speed {:.1} | Volume {:.1} | Pitch {:.1} ",
                    voice, settings.rate, settings.volume, settings.pitch
                ),
                Style::default().fg(theme.fg1),
            ),
        ];

        if let Some(message) = app.status_message.as_deref() {
            spans.push(Span::styled(
                format!("| {} ", message),
                Style::default().fg(theme.grey2),
            ));
        } else if let Some(error) = narration.last_error() {
            spans.push(Span::styled(
                format!("| {} ", error),
                Style::default().fg(theme.error),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg2));
        frame.render_widget(paragraph, area);
    }
}

/// Key reminder line
pub struct HelpBarWidget;

impl HelpBarWidget {
    pub const HINT: &'static str = " space:play/pause r:replay x:stop reveal +/-:volume ]/[:speed }/{:pitch v/V:voice j/k:scroll ?:help q:quit ";

    pub fn render<C: NarrationCapability>(frame: &mut Frame, area: Rect, app: &App<C>) {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            Self::HINT,
            Style::default().fg(app.theme.grey1),
        )))
        .style(Style::default().bg(app.theme.bg1));
        frame.render_widget(paragraph, area);
    }
}

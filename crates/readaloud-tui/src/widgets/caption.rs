use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use readaloud_core::NarrationCapability;

use crate::app::App;

/// Animated status caption above the document
pub struct CaptionWidget;

impl CaptionWidget {
    pub fn render<C: NarrationCapability>(frame: &mut Frame, area: Rect, app: &App<C>) {
        let theme = &app.theme;
        let (revealed, total) = app.session.progress();

        let mut spans = vec![Span::styled(
            format!(" {}", app.session.label()),
            Style::default()
                .fg(theme.caption)
                .add_modifier(Modifier::BOLD),
        )];
        if total > 0 {
            spans.push(Span::styled(
                format!("  {}/{} words", revealed, total),
                Style::default().fg(theme.grey1),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg1));
        frame.render_widget(paragraph, area);
    }
}

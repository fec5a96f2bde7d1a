use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use readaloud_core::{NarrationCapability, Viewport};

use crate::app::App;

/// Document pane showing the revealed prefix
pub struct DocumentWidget;

impl DocumentWidget {
    pub fn render<C: NarrationCapability>(frame: &mut Frame, area: Rect, app: &mut App<C>) {
        let theme = app.theme.clone();

        let follow = if app.session.is_following() { " [follow] " } else { "" };
        let block = Block::default()
            .title(format!(" {} ", app.title))
            .title_bottom(Line::from(follow).right_aligned())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .style(Style::default().bg(theme.bg0));

        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        // Lines are wrapped by the viewport so follow mode knows the real extent
        app.resize_viewport(inner_area.width, inner_area.height);

        let Some(viewport) = app.viewport() else {
            return;
        };
        let lines: Vec<Line> = viewport
            .lines()
            .iter()
            .map(|line| Line::from(Span::styled(line.as_str(), Style::default().fg(theme.fg0))))
            .collect();

        let paragraph = Paragraph::new(Text::from(lines)).scroll((viewport.offset(), 0));
        frame.render_widget(paragraph, inner_area);
    }
}

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tui::app::Screen;

/// Bottom help bar showing context-sensitive key bindings.
pub struct HelpBar<'a> {
    pub screen: &'a Screen,
    /// A scan or reply is in flight, so the submit key does nothing.
    pub busy: bool,
}

impl Widget for HelpBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::DarkGray);
        let key_style = Style::default().fg(Color::Cyan);

        let mut spans: Vec<Span> = match self.screen {
            Screen::Dashboard => vec![
                Span::styled("j/k", key_style),
                Span::styled(" navigate  ", style),
                Span::styled("Enter", key_style),
                Span::styled(" open  ", style),
                Span::styled("s", key_style),
                Span::styled(" scan  ", style),
                Span::styled("c", key_style),
                Span::styled(" chat  ", style),
                Span::styled("Tab", key_style),
                Span::styled(" next screen  ", style),
                Span::styled("q", key_style),
                Span::styled(" quit", style),
            ],
            Screen::Detail => vec![
                Span::styled("j/k", key_style),
                Span::styled(" scroll  ", style),
                Span::styled("PgUp/PgDn", key_style),
                Span::styled(" page  ", style),
                Span::styled("Esc", key_style),
                Span::styled(" back  ", style),
                Span::styled("q", key_style),
                Span::styled(" quit", style),
            ],
            Screen::Analyzer => vec![
                Span::styled("Enter", key_style),
                Span::styled(" identify  ", style),
                Span::styled("Tab", key_style),
                Span::styled(" next screen  ", style),
                Span::styled("Esc", key_style),
                Span::styled(" back  ", style),
                Span::styled("Ctrl+C", key_style),
                Span::styled(" quit", style),
            ],
            Screen::Chat => vec![
                Span::styled("Enter", key_style),
                Span::styled(" send  ", style),
                Span::styled("PgUp/PgDn", key_style),
                Span::styled(" scroll  ", style),
                Span::styled("Esc", key_style),
                Span::styled(" leave chat  ", style),
                Span::styled("Ctrl+C", key_style),
                Span::styled(" quit", style),
            ],
        };

        if self.busy {
            spans.push(Span::styled("  · waiting for the model…", Style::default().fg(Color::Yellow)));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tui::app::{Screen, NAV_SCREENS};

/// Top navigation bar: brand plus one tab per screen, current one highlighted.
pub struct NavBar<'a> {
    pub current: &'a Screen,
}

impl Widget for NavBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans: Vec<Span> = vec![Span::styled(
            " ✿ BloomBot ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];

        for (i, screen) in NAV_SCREENS.iter().enumerate() {
            let active = screen.title() == self.current.title();
            let style = if active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            spans.push(Span::styled(format!(" {} ", screen.title()), style));

            if i < NAV_SCREENS.len() - 1 {
                spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
            }
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

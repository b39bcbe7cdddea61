use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Single-line text input with cursor and focus highlight.
pub struct TextInput<'a> {
    pub text: &'a str,
    pub cursor: usize,
    pub title: &'a str,
    /// Shown dimmed while `text` is empty.
    pub placeholder: &'a str,
    pub focused: bool,
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focused {
            Color::Green
        } else {
            Color::DarkGray
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(self.title);

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let prefix = Span::styled("❯ ", Style::default().fg(Color::Green));

        if self.text.is_empty() && !self.focused {
            let line = Line::from(vec![
                prefix,
                Span::styled(self.placeholder, Style::default().fg(Color::DarkGray)),
            ]);
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        let cursor = self.cursor.min(self.text.len());
        let (before_cursor, after_cursor) = self.text.split_at(cursor);

        let mut spans = vec![prefix, Span::raw(before_cursor)];

        if self.focused {
            let cursor_char = after_cursor.chars().next().unwrap_or(' ');
            spans.push(Span::styled(
                cursor_char.to_string(),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            if after_cursor.len() > cursor_char.len_utf8() {
                spans.push(Span::raw(&after_cursor[cursor_char.len_utf8()..]));
            }
        } else {
            spans.push(Span::raw(after_cursor));
        }

        let line = Line::from(spans);
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}

use bloombot_core::model::{ConversationTurn, TurnRole};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::{
    app::App,
    views::frame_areas,
    widgets::{help_bar::HelpBar, nav_bar::NavBar, text_input::TextInput},
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [nav, body, help] = frame_areas(area);
    frame.render_widget(NavBar { current: &app.screen }, nav);

    let [transcript, input] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(body);

    render_transcript(frame, app, transcript);

    let streaming = app.conversation.is_streaming();
    frame.render_widget(
        TextInput {
            text: &app.chat_input.text,
            cursor: app.chat_input.cursor,
            title: " Ask about pests, watering, soil… ",
            placeholder: "",
            focused: !streaming,
        },
        input,
    );

    frame.render_widget(
        HelpBar {
            screen: &app.screen,
            busy: streaming,
        },
        help,
    );
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let streaming = app.conversation.streaming_turn();
    let mut lines: Vec<Line> = Vec::new();

    for turn in app.conversation.turns() {
        let in_flight = streaming.is_some_and(|s| std::ptr::eq(s, turn));
        push_turn(&mut lines, turn, in_flight);
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" BloomBot Expert ");
    let inner = block.inner(area);

    // Keep the newest turn in view unless the user scrolled up.
    let total = wrapped_height(&lines, inner.width);
    let bottom = total.saturating_sub(inner.height);
    let offset = bottom.saturating_sub(app.chat_scroll);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn push_turn(lines: &mut Vec<Line<'static>>, turn: &ConversationTurn, in_flight: bool) {
    let (label, color) = match turn.role {
        TurnRole::User => ("you", Color::Cyan),
        TurnRole::Model => ("bloombot", Color::Green),
    };
    lines.push(Line::from(Span::styled(
        format!(" {label}"),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));

    if in_flight && turn.text.is_empty() {
        lines.push(Line::from(Span::styled(
            "   typing…",
            Style::default().fg(Color::DarkGray),
        )));
        return;
    }

    for text in turn.text.lines() {
        lines.push(Line::from(format!("   {text}")));
    }
    if in_flight {
        lines.push(Line::from(Span::styled("   ▍", Style::default().fg(Color::Green))));
    }
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = width as usize;
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

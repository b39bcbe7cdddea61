use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const LOGO: &[&str] = &[
    r" _     _                       _           _   ",
    r"| |__ | | ___   ___  _ __ ___ | |__   ___ | |_ ",
    r"| '_ \| |/ _ \ / _ \| '_ ` _ \| '_ \ / _ \| __|",
    r"| |_) | | (_) | (_) | | | | | | |_) | (_) | |_ ",
    r"|_.__/|_|\___/ \___/|_| |_| |_|_.__/ \___/ \__|",
];

pub fn render(frame: &mut Frame, area: Rect, model: &str) {
    let block_height = LOGO.len() as u16 + 6;
    let block_width = 50;

    let [center_y] = Layout::vertical([Constraint::Length(block_height)])
        .flex(Flex::Center)
        .areas(area);
    let [center] = Layout::horizontal([Constraint::Length(block_width)])
        .flex(Flex::Center)
        .areas(center_y);

    let mut lines: Vec<Line> = Vec::new();

    for row in LOGO {
        lines.push(Line::from(Span::styled(
            *row,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
    }

    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "      Identify plants. Grow them better.",
        Style::default().fg(Color::DarkGray),
    )));

    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        Span::styled("          model ", Style::default().fg(Color::DarkGray)),
        Span::styled(model, Style::default().fg(Color::Magenta)),
    ]));

    frame.render_widget(Paragraph::new(lines), center);
}

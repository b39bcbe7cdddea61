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
    widgets::{
        care_card::{care_lines, difficulty_color},
        help_bar::HelpBar,
        nav_bar::NavBar,
        text_input::TextInput,
    },
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [nav, body, help] = frame_areas(area);
    frame.render_widget(NavBar { current: &app.screen }, nav);

    let [input, result] = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).areas(body);

    frame.render_widget(
        TextInput {
            text: &app.path_input.text,
            cursor: app.path_input.cursor,
            title: " Photo path ",
            placeholder: "~/Pictures/plant.jpg",
            focused: !app.analyzing,
        },
        input,
    );

    render_result(frame, app, result);

    frame.render_widget(
        HelpBar {
            screen: &app.screen,
            busy: app.analyzing,
        },
        help,
    );
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = Vec::new();

    if app.analyzing {
        lines.push(Line::from(Span::styled(
            "  Analyzing photo… the model is thinking.",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    } else if let Some(plant) = app.history.latest().filter(|_| app.show_result) {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {} ", plant.common_name),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                plant.scientific_name.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
            Span::styled("  ", dim),
            Span::styled(
                plant.difficulty.to_string(),
                Style::default().fg(difficulty_color(plant.difficulty)),
            ),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(format!("  {}", plant.description)));
        lines.push(Line::from(""));
        lines.extend(care_lines(&plant.care));
    } else {
        lines.push(Line::from(Span::styled(
            "  Type the path to a plant photo and press Enter.",
            dim,
        )));
        lines.push(Line::from(Span::styled(
            "  JPEG, PNG, WebP and HEIC photos work best when the leaves are in focus.",
            dim,
        )));
    }

    let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Identification "),
    );
    frame.render_widget(widget, area);
}

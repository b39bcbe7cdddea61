use bloombot_core::model::PlantIdentification;
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
    },
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [nav, body, help] = frame_areas(area);
    frame.render_widget(NavBar { current: &app.screen }, nav);
    frame.render_widget(
        HelpBar {
            screen: &app.screen,
            busy: false,
        },
        help,
    );

    let Some(plant) = app.selected_plant() else {
        let msg = Paragraph::new("No plant selected.").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, body);
        return;
    };

    let layout = Layout::vertical([
        Constraint::Length(2), // title
        Constraint::Length(1), // meta line
        Constraint::Min(5),    // content (scrollable)
    ])
    .split(body);

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", plant.common_name),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            &plant.scientific_name,
            Style::default().add_modifier(Modifier::ITALIC),
        ),
    ]);
    let title_widget = Paragraph::new(title).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(title_widget, layout[0]);

    let meta = Line::from(vec![
        Span::styled(format!(" {} ", plant.short_id()), Style::default().fg(Color::Cyan)),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            plant.difficulty.to_string(),
            Style::default().fg(difficulty_color(plant.difficulty)),
        ),
        Span::styled(" │ origin: ", Style::default().fg(Color::DarkGray)),
        Span::raw(plant.origin.as_deref().unwrap_or("unknown")),
        Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            plant.identified_at.format("%Y-%m-%d %H:%M").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(meta), layout[1]);

    render_content(frame, app, plant, layout[2]);
}

fn render_content(frame: &mut Frame, app: &App, plant: &PlantIdentification, area: Rect) {
    let section = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled("─── About ───", section)));
    lines.push(Line::from(""));
    for line in plant.description.lines() {
        lines.push(Line::from(line.to_string()));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("─── Care Guide ───", section)));
    lines.push(Line::from(""));
    lines.extend(care_lines(&plant.care));

    if let Some(ref image) = plant.image {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  photo attached ({} bytes encoded)", image.len()),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Plant (j/k to scroll) "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    frame.render_widget(paragraph, area);
}

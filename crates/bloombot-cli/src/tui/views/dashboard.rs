use bloombot_core::model::Difficulty;
use bloombot_core::HISTORY_CAPACITY;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::tui::{
    app::App,
    views::frame_areas,
    widgets::{
        care_card::{care_summary, difficulty_color},
        help_bar::HelpBar,
        nav_bar::NavBar,
    },
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [nav, body, help] = frame_areas(area);
    frame.render_widget(NavBar { current: &app.screen }, nav);

    let [stats, table] = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).areas(body);
    render_stats(frame, app, stats);
    render_table(frame, app, table);

    frame.render_widget(
        HelpBar {
            screen: &app.screen,
            busy: app.analyzing,
        },
        help,
    );
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let easy = app
        .history
        .iter()
        .filter(|p| p.difficulty == Difficulty::Easy)
        .count();
    let latest = app
        .history
        .latest()
        .map(|p| p.common_name.as_str())
        .unwrap_or("—");

    let label = Style::default().fg(Color::DarkGray);
    let line = Line::from(vec![
        Span::styled(" identified ", label),
        Span::styled(
            format!("{}/{HISTORY_CAPACITY}", app.history.len()),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  │ easy care ", label),
        Span::styled(easy.to_string(), Style::default().fg(Color::Green)),
        Span::styled("  │ latest ", label),
        Span::styled(latest, Style::default().fg(Color::Cyan)),
    ]);

    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" My Garden "),
    );
    frame.render_widget(widget, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("ID"),
        Cell::from("Plant"),
        Cell::from("Species"),
        Cell::from("Difficulty"),
        Cell::from("Care"),
        Cell::from("When"),
    ])
    .style(
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )
    .bottom_margin(1);

    let rows: Vec<Row> = if app.history.is_empty() {
        vec![Row::new(vec![Cell::from(Span::styled(
            "  No plants yet. Press s to scan your first plant.",
            Style::default().fg(Color::DarkGray),
        ))])]
    } else {
        app.history
            .iter()
            .map(|plant| {
                Row::new(vec![
                    Cell::from(Span::styled(plant.short_id(), Style::default().fg(Color::Cyan))),
                    Cell::from(plant.common_name.clone()),
                    Cell::from(Span::styled(
                        plant.scientific_name.clone(),
                        Style::default().add_modifier(Modifier::ITALIC),
                    )),
                    Cell::from(Span::styled(
                        plant.difficulty.to_string(),
                        Style::default().fg(difficulty_color(plant.difficulty)),
                    )),
                    Cell::from(care_summary(&plant.care)),
                    Cell::from(Span::styled(
                        plant.identified_at.format("%m-%d %H:%M").to_string(),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect()
    };

    let widths = [
        Constraint::Length(10),
        Constraint::Min(16),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(24),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" Recent Identifications ({}) ", app.history.len())),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::Indexed(236))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = TableState::default();
    if !app.history.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

use bloombot_core::model::{care_badge, Difficulty, PlantCareProfile};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub fn difficulty_color(difficulty: Difficulty) -> Color {
    match difficulty {
        Difficulty::Easy => Color::Green,
        Difficulty::Moderate => Color::Yellow,
        Difficulty::Challenging => Color::Red,
    }
}

/// Labelled rows for the five care fields.
pub fn care_lines(care: &PlantCareProfile) -> Vec<Line<'static>> {
    let rows = [
        ("💧 Watering   ", &care.watering, Color::Blue),
        ("☀  Sunlight   ", &care.sunlight, Color::Yellow),
        ("🪴 Soil       ", &care.soil, Color::Rgb(160, 110, 60)),
        ("🌱 Fertilizer ", &care.fertilizer, Color::Green),
        ("⚠  Toxicity   ", &care.toxicity, Color::Red),
    ];

    rows.into_iter()
        .map(|(label, value, color)| {
            Line::from(vec![
                Span::styled(
                    format!("  {label}"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(value.clone()),
            ])
        })
        .collect()
}

/// One-line badge summary: watering and sunlight first words.
pub fn care_summary(care: &PlantCareProfile) -> String {
    format!(
        "💧 {}  ☀ {}",
        care_badge(&care.watering),
        care_badge(&care.sunlight)
    )
}

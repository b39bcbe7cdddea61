pub mod analyzer;
pub mod chat;
pub mod dashboard;
pub mod detail;
pub mod splash;

use ratatui::layout::{Constraint, Layout, Rect};

/// Split a screen into nav bar, body and help bar.
pub(crate) fn frame_areas(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1), // nav bar
        Constraint::Min(5),    // body
        Constraint::Length(1), // help bar
    ])
    .areas(area)
}
